use std::{collections::BTreeSet, process::ExitCode, sync::Arc};

use chrono::{Local, NaiveDate};
use client_core::{
    AuthService, AutoConfirm, BulkOutcome, ClientError, Confirmer, FilterState, FormOutcome,
    NominationForm, NominationListView, Notice, Session, TrackerApi, UserDirectoryView, UserForm,
    UserSaveOutcome,
};
use serde_json::json;
use shared::domain::{NominationId, UserId};
use tracing::debug;

use crate::{
    config::Settings,
    prompt::{self, StdinConfirmer},
    render, Command, ListArgs, NominationFields, UsersCommand,
};

pub(crate) struct App {
    api: Arc<dyn TrackerApi>,
    auth: AuthService,
    settings: Settings,
    confirmer: Box<dyn Confirmer>,
}

impl App {
    pub(crate) fn new(
        api: Arc<dyn TrackerApi>,
        session: Arc<Session>,
        settings: Settings,
        assume_yes: bool,
    ) -> Self {
        let confirmer: Box<dyn Confirmer> = if assume_yes {
            Box::new(AutoConfirm)
        } else {
            Box::new(StdinConfirmer)
        };
        Self {
            auth: AuthService::new(Arc::clone(&api), session),
            api,
            settings,
            confirmer,
        }
    }

    /// Runs one command and reports its outcome as a single notice.
    pub(crate) async fn run(&self, command: Command) -> ExitCode {
        let fallback = failure_message(&command);
        match self.execute(command).await {
            Ok(Some(notice)) => {
                println!("{notice}");
                ExitCode::SUCCESS
            }
            Ok(None) => ExitCode::SUCCESS,
            Err(CommandError::Client(err)) => {
                debug!(error = ?err, "command failed");
                eprintln!("{}", Notice::from_error(&err, fallback));
                ExitCode::FAILURE
            }
            Err(CommandError::Local(err)) => {
                eprintln!("{fallback}: {err:#}");
                ExitCode::FAILURE
            }
        }
    }

    async fn execute(&self, command: Command) -> Result<Option<Notice>, CommandError> {
        match command {
            Command::Login { name, password } => {
                let password = match password {
                    Some(password) => password,
                    None => prompt::ask("Password").await?,
                };
                let user = self.auth.login(&name, &password).await?;
                Ok(Some(Notice::success(format!(
                    "Login successful ({}{})",
                    user.name,
                    if user.is_admin { ", admin" } else { "" }
                ))))
            }
            Command::Logout => {
                self.auth.logout().await;
                Ok(Some(Notice::success("Logged out")))
            }
            Command::Whoami => match self.auth.restore().await? {
                Some(user) => {
                    println!("{} ({})", user.name, user.id);
                    Ok(None)
                }
                None => Err(ClientError::Auth("not logged in".to_string()).into()),
            },
            other => {
                self.auth.restore().await?;
                self.execute_authenticated(other).await
            }
        }
    }

    async fn execute_authenticated(
        &self,
        command: Command,
    ) -> Result<Option<Notice>, CommandError> {
        match command {
            Command::List { filter, json } => {
                let view = self.list_view(&filter).await?;
                let Some(listing) = view.listing().await else {
                    return Ok(None);
                };
                if json {
                    let out = json!({
                        "nominations": listing.page.items,
                        "total": listing.page.total,
                        "page": view.criteria().await.page.get(),
                        "stats": listing.stats,
                    });
                    print_json(&out)?;
                } else {
                    let rows = view.rows(today()).await;
                    println!("{}", render::stats_summary(&listing.stats));
                    print!(
                        "{}",
                        render::nomination_table(&rows, &listing, &view.criteria().await)
                    );
                }
                Ok(None)
            }
            Command::Stats => {
                let stats = self.api.nomination_stats().await?;
                println!("{}", render::stats_summary(&stats));
                Ok(None)
            }
            Command::Show { id } => {
                let item = self.api.get_nomination(&NominationId::new(id)).await?;
                print!("{}", render::nomination_detail(&item, today()));
                Ok(None)
            }
            Command::Create { fields } => {
                let mut form = NominationForm::new();
                apply_fields(&mut form, fields)?;
                self.save_nomination(&form).await
            }
            Command::Edit { id, fields } => {
                let mut form =
                    NominationForm::load_for_edit(self.api.as_ref(), &NominationId::new(id))
                        .await?;
                apply_fields(&mut form, fields)?;
                self.save_nomination(&form).await
            }
            Command::Delete { id } => {
                let view = self.bare_list_view();
                if view
                    .delete(&NominationId::new(id), self.confirmer.as_ref())
                    .await?
                {
                    Ok(Some(Notice::success("Deleted successfully")))
                } else {
                    Ok(Some(Notice::success("Cancelled")))
                }
            }
            Command::Assign { id, user, .. } => {
                let user = user.map(UserId::new);
                self.bare_list_view()
                    .assign(&NominationId::new(id), user.as_ref())
                    .await?;
                Ok(Some(Notice::success(if user.is_some() {
                    "User assigned"
                } else {
                    "User unassigned"
                })))
            }
            Command::Bulk {
                action,
                ids,
                all,
                filter,
            } => {
                let view = self.list_view(&filter).await?;
                if all {
                    view.select_all().await;
                } else {
                    let unique: BTreeSet<String> = ids.into_iter().collect();
                    for id in unique {
                        view.toggle(&NominationId::new(id)).await?;
                    }
                }
                match view
                    .apply_bulk_action(Some(action), self.confirmer.as_ref())
                    .await?
                {
                    BulkOutcome::Applied { action, count } => Ok(Some(Notice::success(format!(
                        "Bulk update done: {count} nomination(s) marked {action}"
                    )))),
                    BulkOutcome::Cancelled => Ok(Some(Notice::success("Cancelled"))),
                }
            }
            Command::Send { id } => {
                let content = self
                    .bare_list_view()
                    .send_content(&NominationId::new(id))
                    .await?;
                println!("{content}");
                Ok(None)
            }
            Command::SendAll { id } => {
                let content = self
                    .bare_list_view()
                    .send_all_content(&NominationId::new(id))
                    .await?;
                println!("{content}");
                Ok(None)
            }
            Command::Scan => {
                let report = self.bare_list_view().scan_contracts().await?;
                print_json(&report)?;
                Ok(Some(Notice::success("Contract scan finished")))
            }
            Command::Settings => {
                let settings = self.api.settings().await?;
                print_json(&settings)?;
                Ok(None)
            }
            Command::Users { command } => self.execute_users(command).await,
            Command::Login { .. } | Command::Logout | Command::Whoami => Ok(None),
        }
    }

    async fn execute_users(
        &self,
        command: UsersCommand,
    ) -> Result<Option<Notice>, CommandError> {
        let directory =
            UserDirectoryView::new(Arc::clone(&self.api), Arc::clone(self.auth.session()));
        directory.refresh().await?;

        match command {
            UsersCommand::List => {
                print!("{}", render::user_table(&directory.users().await));
                Ok(None)
            }
            UsersCommand::Create { name, password } => {
                let mut form = UserForm::create();
                form.name = name;
                form.password = match password {
                    Some(password) => password,
                    None => prompt::ask("Password").await?,
                };
                Ok(Some(save_notice(directory.save(&form).await?)))
            }
            UsersCommand::Edit { id, name, password } => {
                let id = UserId::new(id);
                let user = directory
                    .users()
                    .await
                    .into_iter()
                    .find(|user| user.id == id)
                    .ok_or_else(|| ClientError::validation(format!("No user with id {id}")))?;
                let mut form = UserForm::edit(&user);
                if let Some(name) = name {
                    form.name = name;
                }
                if let Some(password) = password {
                    form.password = password;
                }
                Ok(Some(save_notice(directory.save(&form).await?)))
            }
            UsersCommand::Delete { id } => {
                let deleted = directory
                    .delete(&UserId::new(id), self.confirmer.as_ref())
                    .await?;
                Ok(Some(Notice::success(if deleted {
                    "User deleted"
                } else {
                    "Cancelled"
                })))
            }
        }
    }

    /// List view loaded once with every filter from the command line.
    async fn list_view(&self, args: &ListArgs) -> Result<NominationListView, ClientError> {
        let page_size = args.page_size.unwrap_or(self.settings.page_size);
        let view = NominationListView::new(Arc::clone(&self.api), page_size);
        let assignee = args.user.clone().map(UserId::new);
        let status = args.status;
        let page = args.page;
        view.update_filter(move |filter: &mut FilterState| {
            filter.set_assignee(assignee);
            filter.set_status(status);
            filter.set_page(page);
        })
        .await?;
        Ok(view)
    }

    /// List view for single-item operations; reloads after a mutation use the
    /// default criteria.
    fn bare_list_view(&self) -> NominationListView {
        NominationListView::new(Arc::clone(&self.api), self.settings.page_size)
    }

    async fn save_nomination(
        &self,
        form: &NominationForm,
    ) -> Result<Option<Notice>, CommandError> {
        let message = match form.submit(self.api.as_ref()).await? {
            FormOutcome::Created => "Nomination created",
            FormOutcome::Updated => "Nomination updated",
        };
        Ok(Some(Notice::success(message)))
    }
}

#[derive(Debug)]
enum CommandError {
    Client(ClientError),
    Local(anyhow::Error),
}

impl From<ClientError> for CommandError {
    fn from(value: ClientError) -> Self {
        CommandError::Client(value)
    }
}

impl From<anyhow::Error> for CommandError {
    fn from(value: anyhow::Error) -> Self {
        CommandError::Local(value)
    }
}

fn failure_message(command: &Command) -> &'static str {
    match command {
        Command::Login { .. } => "Login failed",
        Command::Logout | Command::Whoami => "Session check failed",
        Command::List { .. } | Command::Stats | Command::Show { .. } => {
            "Failed to load nominations"
        }
        Command::Create { .. } | Command::Edit { .. } => "Error saving nomination",
        Command::Delete { .. } => "Failed to delete",
        Command::Assign { .. } => "Failed to assign user",
        Command::Bulk { .. } => "Failed to update",
        Command::Send { .. } => "Failed to generate message",
        Command::SendAll { .. } => "Failed to generate bulk message",
        Command::Scan => "Failed to scan contracts",
        Command::Settings => "Failed to load settings",
        Command::Users { command } => match command {
            UsersCommand::List => "Failed to load users",
            UsersCommand::Create { .. } | UsersCommand::Edit { .. } => "Error saving user",
            UsersCommand::Delete { .. } => "Delete failed",
        },
    }
}

fn apply_fields(form: &mut NominationForm, fields: NominationFields) -> Result<(), ClientError> {
    let NominationFields {
        contract,
        buyer,
        seller,
        arrival,
        date,
        nomination_type,
        keyword,
        party,
    } = fields;
    let targets = [
        (contract, &mut form.contract_name),
        (buyer, &mut form.buyer),
        (seller, &mut form.seller),
        (arrival, &mut form.arrival_period),
        (date, &mut form.nomination_date),
        (nomination_type, &mut form.nomination_type),
        (keyword, &mut form.nomination_keyword),
    ];
    for (value, target) in targets {
        if let Some(value) = value {
            *target = value;
        }
    }
    if let Some(party) = party {
        form.set_party(&party)?;
    }
    Ok(())
}

fn save_notice(outcome: UserSaveOutcome) -> Notice {
    Notice::success(match outcome {
        UserSaveOutcome::Created => "User created",
        UserSaveOutcome::Updated => "User updated",
    })
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
