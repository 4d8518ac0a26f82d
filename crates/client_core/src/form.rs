use chrono::NaiveDate;
use shared::{
    domain::{NominationId, Party},
    protocol::{calendar_date, Nomination, NominationInput},
};
use tracing::info;

use crate::{error::ClientError, TrackerApi};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormOutcome {
    Created,
    Updated,
}

/// Editable copy of a nomination. Dates are kept as the text the user typed
/// and only parsed by [`NominationForm::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NominationForm {
    editing: Option<NominationId>,
    pub contract_name: String,
    pub buyer: String,
    pub seller: String,
    pub arrival_period: String,
    pub nomination_date: String,
    pub nomination_type: String,
    pub nomination_keyword: String,
    pub for_seller_or_buyer: Party,
}

impl NominationForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nomination(item: &Nomination) -> Self {
        Self {
            editing: Some(item.id.clone()),
            contract_name: item.contract_name.clone(),
            buyer: item.buyer.clone(),
            seller: item.seller.clone(),
            arrival_period: format_date(item.arrival_date),
            nomination_date: format_date(item.nomination_date),
            nomination_type: item.nomination_type.clone(),
            nomination_keyword: item.nomination_keyword.clone(),
            for_seller_or_buyer: item.for_seller_or_buyer,
        }
    }

    /// Fetches `id` and prefills the form with it.
    pub async fn load_for_edit(
        api: &dyn TrackerApi,
        id: &NominationId,
    ) -> Result<Self, ClientError> {
        let item = api.get_nomination(id).await?;
        Ok(Self::from_nomination(&item))
    }

    pub fn editing(&self) -> Option<&NominationId> {
        self.editing.as_ref()
    }

    pub fn set_party(&mut self, raw: &str) -> Result<(), ClientError> {
        self.for_seller_or_buyer = Party::parse(raw).ok_or_else(|| {
            ClientError::validation(format!("'{raw}' is not one of: seller, buyer"))
        })?;
        Ok(())
    }

    pub fn validate(&self) -> Result<NominationInput, ClientError> {
        Ok(NominationInput {
            contract_name: required("Contract name", &self.contract_name)?,
            buyer: required("Buyer", &self.buyer)?,
            seller: required("Seller", &self.seller)?,
            arrival_period: required_date("Arrival period", &self.arrival_period)?,
            nomination_date: required_date("Nomination date", &self.nomination_date)?,
            nomination_type: required("Nomination type", &self.nomination_type)?,
            nomination_keyword: required("Nomination keyword", &self.nomination_keyword)?,
            for_seller_or_buyer: self.for_seller_or_buyer,
        })
    }

    pub async fn submit(&self, api: &dyn TrackerApi) -> Result<FormOutcome, ClientError> {
        let input = self.validate()?;
        match &self.editing {
            Some(id) => {
                api.update_nomination(id, &input).await?;
                info!(nomination = %id, "nomination updated");
                Ok(FormOutcome::Updated)
            }
            None => {
                api.create_nomination(&input).await?;
                info!(contract = %input.contract_name, "nomination created");
                Ok(FormOutcome::Created)
            }
        }
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(calendar_date::FORMAT).to_string()
}

fn required(label: &str, value: &str) -> Result<String, ClientError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ClientError::validation(format!("{label} is required")));
    }
    Ok(value.to_string())
}

fn required_date(label: &str, value: &str) -> Result<NaiveDate, ClientError> {
    let value = required(label, value)?;
    calendar_date::parse(&value).ok_or_else(|| {
        ClientError::validation(format!("{label} must be a date in YYYY-MM-DD format"))
    })
}
