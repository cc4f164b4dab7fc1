//! Interactive line shell over [`DocumentClient`].
//!
//! The shell never fetches lists itself. It mounts the query for the current
//! window and renders whatever the cache publishes, so a successful mutation
//! (which invalidates the documents) re-renders the listing on its own.
//! Cache and session callbacks are forwarded over an unbounded channel and
//! handled between input lines.

mod command;
mod render;

pub use command::{help_text, parse_line, ShellCommand};
pub use render::{document_page, document_table, page_footer};

use std::fmt;
use std::io;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::api::DocumentItem;
use crate::cache::{QueryEvent, QueryFilter, QueryKey, Subscription};
use crate::client::{DocumentClient, QueryData};
use crate::config::DocumentsConfig;
use crate::pagination::PaginationController;
use crate::session::SessionSubscription;

/// Something that happened outside the input loop.
#[derive(Debug, Clone)]
pub enum ShellEvent {
    Query(QueryKey, QueryEvent<QueryData>),
    Session(Option<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Shell settings taken from `[documents]`.
#[derive(Debug, Clone)]
pub struct ShellOptions {
    pub page_size: NonZeroU32,
    pub page_size_options: Vec<u32>,
    pub paginated: bool,
}

impl From<&DocumentsConfig> for ShellOptions {
    fn from(config: &DocumentsConfig) -> Self {
        Self {
            page_size: NonZeroU32::new(config.default_page_size).unwrap_or(NonZeroU32::MIN),
            page_size_options: config.page_size_options.clone(),
            paginated: config.paginated,
        }
    }
}

struct Listing {
    key: QueryKey,
    _subscription: Subscription,
}

pub struct Shell<W> {
    client: Arc<DocumentClient>,
    options: ShellOptions,
    pagination: PaginationController,
    listing: Option<Listing>,
    events_tx: mpsc::UnboundedSender<ShellEvent>,
    events_rx: mpsc::UnboundedReceiver<ShellEvent>,
    _session: SessionSubscription,
    out: W,
}

impl<W: AsyncWrite + Unpin> Shell<W> {
    pub fn new(client: Arc<DocumentClient>, options: ShellOptions, out: W) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let session_tx = events_tx.clone();
        let session = client.session().subscribe(move |name| {
            let _ = session_tx.send(ShellEvent::Session(name.map(str::to_string)));
        });

        Self {
            pagination: PaginationController::new(options.page_size),
            client,
            options,
            listing: None,
            events_tx,
            events_rx,
            _session: session,
            out,
        }
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn pagination(&self) -> &PaginationController {
        &self.pagination
    }

    /// Greet and mount the listing if a session was restored.
    pub async fn start(&mut self) -> io::Result<()> {
        match self.client.session().current() {
            Some(name) => {
                self.say(&format!("Signed in as {}. Type `help` for commands.", name))
                    .await?;
                self.mount_listing();
            }
            None => {
                self.say("Not signed in. Use `login <username> <password>` or `help`.")
                    .await?;
            }
        }
        Ok(())
    }

    /// Read lines until `quit` or end of input, handling events in between.
    pub async fn run<R: AsyncBufRead + Unpin>(mut self, input: R) -> io::Result<()> {
        self.start().await?;
        let mut lines = input.lines();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if self.execute(&line).await? == Flow::Quit {
                        break;
                    }
                }
                Some(event) = self.events_rx.recv() => {
                    self.handle_event(event).await?;
                }
            }
        }
        Ok(())
    }

    /// Wait for the next event and handle it. `None` once the channel closes.
    pub async fn pump(&mut self) -> io::Result<Option<()>> {
        match self.events_rx.recv().await {
            Some(event) => self.handle_event(event).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn execute(&mut self, line: &str) -> io::Result<Flow> {
        let command = match parse_line(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Ok(Flow::Continue),
            Err(err) => {
                self.say(err.to_string().trim_end()).await?;
                return Ok(Flow::Continue);
            }
        };
        let flow = self.dispatch(command).await?;
        self.client.cache().collect_garbage();
        Ok(flow)
    }

    async fn dispatch(&mut self, command: ShellCommand) -> io::Result<Flow> {
        match command {
            ShellCommand::Login { username, password } => {
                match self.client.login(&username, &password).await {
                    Ok(name) => self.say(&format!("Welcome, {}.", name)).await?,
                    Err(err) => self.fail(&err).await?,
                }
            }
            ShellCommand::Logout => match self.client.logout().await {
                Ok(()) => {}
                Err(err) => self.fail(&err).await?,
            },
            ShellCommand::Register { username, password } => {
                match self.client.register(&username, &password).await {
                    Ok(()) => {
                        self.say("Account created. Sign in with `login`.").await?
                    }
                    Err(err) => self.fail(&err).await?,
                }
            }
            ShellCommand::Whoami => self.whoami().await?,
            ShellCommand::List => self.show_listing().await?,
            ShellCommand::Refresh => {
                if let Some(listing) = &self.listing {
                    self.client.invalidate(&QueryFilter::Exact(listing.key.clone()));
                } else {
                    self.say("Nothing to refresh.").await?;
                }
            }
            ShellCommand::First => self.navigate(|p| p.first()).await?,
            ShellCommand::Previous => self.navigate(|p| p.previous()).await?,
            ShellCommand::Next => self.navigate(|p| p.next()).await?,
            ShellCommand::Last => self.navigate(|p| p.last()).await?,
            ShellCommand::Goto { page } => self.navigate(|p| p.goto_page(&page)).await?,
            ShellCommand::Size { size } => {
                if self.options.page_size_options.contains(&size) {
                    self.navigate(|p| p.set_page_size(size)).await?;
                } else {
                    let choices: Vec<String> = self
                        .options
                        .page_size_options
                        .iter()
                        .map(u32::to_string)
                        .collect();
                    self.say(&format!("Page size must be one of: {}", choices.join(", ")))
                        .await?;
                }
            }
            ShellCommand::Upload { paths } => match self.client.upload(&paths).await {
                Ok(()) => self.say("Uploaded.").await?,
                Err(err) => self.fail(&err).await?,
            },
            ShellCommand::Delete { id } => match self.client.delete(id).await {
                Ok(()) => self.say(&format!("Deleted document {}.", id)).await?,
                Err(err) => self.fail(&err).await?,
            },
            ShellCommand::Process { id } => match self.client.process(id).await {
                Ok(()) => self.say(&format!("Processing started for document {}.", id)).await?,
                Err(err) => self.fail(&err).await?,
            },
            ShellCommand::Download { id, output } => self.download(id, output).await?,
            ShellCommand::Help => {
                let help = help_text();
                self.say(help.trim_end()).await?;
            }
            ShellCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    async fn handle_event(&mut self, event: ShellEvent) -> io::Result<()> {
        match event {
            ShellEvent::Session(Some(name)) => {
                tracing::debug!(user = %name, "Session published");
                self.mount_listing();
            }
            ShellEvent::Session(None) => {
                self.listing = None;
                self.say("Signed out.").await?;
            }
            ShellEvent::Query(key, event) => {
                if self.listing.as_ref().map(|l| &l.key) != Some(&key) {
                    tracing::trace!(key = ?key, "Dropping event for a window no longer shown");
                    return Ok(());
                }
                match event {
                    QueryEvent::Ready(data) => self.render(data).await?,
                    QueryEvent::Failed(err) => {
                        self.say(&format!("Could not load documents: {}", err)).await?
                    }
                }
            }
        }
        Ok(())
    }

    async fn render(&mut self, data: QueryData) -> io::Result<()> {
        match data {
            QueryData::DocumentPage(page) => {
                if self.pagination.set_total(page.total_items) {
                    // The window shrank past the fetched page; show the clamped one instead.
                    self.mount_listing();
                    return Ok(());
                }
                let text = document_page(self.pagination.window(), &page.documents);
                self.say(&text).await
            }
            QueryData::DocumentList(items) => {
                let text = format!(
                    "{}\n{} documents",
                    document_table(&items, 1),
                    items.len()
                );
                self.say(&text).await
            }
            QueryData::Account(_) => Ok(()),
        }
    }

    fn listing_key(&self) -> QueryKey {
        if self.options.paginated {
            QueryKey::DocumentPage(self.pagination.query())
        } else {
            QueryKey::AllDocuments
        }
    }

    /// Replace the listing subscription with one for the current window.
    fn mount_listing(&mut self) {
        let key = self.listing_key();
        let tx = self.events_tx.clone();
        let event_key = key.clone();
        let subscription = self.client.mount(key.clone(), move |event| {
            let _ = tx.send(ShellEvent::Query(event_key.clone(), event.clone()));
        });
        self.listing = Some(Listing {
            key,
            _subscription: subscription,
        });
    }

    async fn show_listing(&mut self) -> io::Result<()> {
        if !self.client.session().is_signed_in() {
            return self.say("Sign in to see documents.").await;
        }
        let cached = self.listing.as_ref().and_then(|listing| {
            self.client
                .cache()
                .snapshot(&listing.key)
                .and_then(|snapshot| snapshot.value)
        });
        match cached {
            Some(data) => self.render(data).await,
            None => {
                self.mount_listing();
                Ok(())
            }
        }
    }

    async fn navigate<F>(&mut self, step: F) -> io::Result<()>
    where
        F: FnOnce(&mut PaginationController) -> bool,
    {
        if !self.options.paginated {
            return self.say("Paging is off (documents.paginated = false).").await;
        }
        if step(&mut self.pagination) {
            if self.client.session().is_signed_in() {
                self.mount_listing();
            }
        } else {
            let window = *self.pagination.window();
            self.say(&page_footer(&window)).await?;
        }
        Ok(())
    }

    async fn whoami(&mut self) -> io::Result<()> {
        let local = self.client.session().current();
        match self.client.account().await {
            Ok(user) => {
                let name = user.username.or(local).unwrap_or_else(|| "unknown".to_string());
                let id = user
                    .user_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "?".to_string());
                self.say(&format!("{} (user id {})", name, id)).await
            }
            Err(err) => match local {
                Some(name) => {
                    self.say(&format!("{} (server says: {})", name, err)).await
                }
                None => self.say(&format!("Not signed in ({}).", err)).await,
            },
        }
    }

    async fn download(&mut self, id: i64, output: Option<PathBuf>) -> io::Result<()> {
        let Some(item) = self.visible_items().into_iter().find(|item| item.id == id) else {
            return self
                .say(&format!("No document with id {} in the current listing.", id))
                .await;
        };

        match self.client.download(&item).await {
            Ok(bytes) => {
                let target = output.unwrap_or_else(|| PathBuf::from(&item.key));
                match tokio::fs::write(&target, &bytes).await {
                    Ok(()) => {
                        self.say(&format!("Saved {} bytes to {}.", bytes.len(), target.display()))
                            .await
                    }
                    Err(err) => {
                        self.say(&format!("Could not write {}: {}", target.display(), err))
                            .await
                    }
                }
            }
            Err(err) => self.fail(&err).await,
        }
    }

    fn visible_items(&self) -> Vec<DocumentItem> {
        let Some(listing) = &self.listing else {
            return Vec::new();
        };
        match self
            .client
            .cache()
            .snapshot(&listing.key)
            .and_then(|snapshot| snapshot.value)
        {
            Some(QueryData::DocumentPage(page)) => page.documents,
            Some(QueryData::DocumentList(items)) => items,
            _ => Vec::new(),
        }
    }

    async fn fail<E: fmt::Display>(&mut self, err: E) -> io::Result<()> {
        let text = format!("Error: {}", err);
        self.say(&text).await
    }

    async fn say(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.as_bytes()).await?;
        self.out.write_all(b"\n").await?;
        self.out.flush().await
    }
}
