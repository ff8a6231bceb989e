//! services/client/src/bin/saga.rs

use bytes::Bytes;
use clap::{Parser, Subcommand};
use client_lib::{
    config::Config,
    error::ClientError,
    session::spawn_session_watcher,
    state::ClientState,
    views::{
        AuthFlow, BookListView, ListingView, NavigationHeader, NovelView, ProfileView,
        SavedNovels, SearchView, ToggleOutcome, UserDirectory,
    },
};
use scroll_saga_core::domain::{Novel, NovelStats, PhotoUpload, ProfileUpdate, Registration};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "saga")]
#[command(about = "Scroll Saga reading client")]
#[command(after_help = "Environment:\n  SAGA_API_BASE_URL   Backend base URL\n  SAGA_SESSION_PATH   Session store file")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and store the session.
    Login { username: String, password: String },
    /// Create an account.
    Register {
        username: String,
        email: String,
        password: String,
        bio: Option<String>,
    },
    /// Forget the stored session.
    Logout,
    /// Show who is logged in.
    Whoami,
    /// List every novel with its stats.
    Novels,
    /// Search novels by title.
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Show a novel with its chapters and comments.
    Novel { id: u64, title: String },
    /// Read one chapter (the first by default).
    Read {
        id: u64,
        title: String,
        chapter: Option<u32>,
    },
    /// Show your book list.
    Booklist,
    /// Add a novel to your book list.
    Save { id: u64 },
    /// Remove a novel from your book list.
    Unsave { id: u64 },
    /// Rate a novel from 1 to 5.
    Rate {
        id: u64,
        title: String,
        #[arg(value_parser = clap::value_parser!(u8).range(1..=5))]
        value: u8,
    },
    /// Post a comment on a novel.
    Comment {
        id: u64,
        title: String,
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Show a profile (your own by default).
    Profile { user_id: Option<u64> },
    /// Edit your own profile.
    EditProfile {
        username: String,
        email: String,
        bio: Option<String>,
    },
    /// Upload a profile photo.
    Photo { path: PathBuf },
    /// List users.
    Users,
    /// Follow session changes until Ctrl-C.
    Watch,
}

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    let cli = Cli::parse();

    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // --- 2. Build the Shared State ---
    let state = ClientState::from_config(config)?;
    info!("Configuration loaded.");

    // --- 3. Dispatch ---
    let cancel = CancellationToken::new();
    run(state, cli.command, &cancel).await
}

async fn run(state: ClientState, command: Command, cancel: &CancellationToken) -> Result<(), ClientError> {
    match command {
        Command::Login { username, password } => {
            let session = AuthFlow::new(state).login(&username, &password, cancel).await?;
            println!("Logged in as {} (#{})", session.username, session.user_id);
        }
        Command::Register {
            username,
            email,
            password,
            bio,
        } => {
            let registration = Registration {
                username,
                email,
                confirm_password: password.clone(),
                password,
                bio,
                profile_photo: None,
            };
            let message = AuthFlow::new(state).register(registration, cancel).await?;
            println!("{message}");
        }
        Command::Logout => {
            AuthFlow::new(state).logout().await?;
            println!("Logged out.");
        }
        Command::Whoami => match state.session.get_session()? {
            Some(session) => println!("{} (#{})", session.username, session.user_id),
            None => println!("Not logged in."),
        },
        Command::Novels => {
            let view = ListingView::new(state);
            view.load(cancel).await?;
            let model = view.snapshot().await;
            for novel in &model.novels {
                print_novel(novel, model.stats.get(&novel.id));
            }
        }
        Command::Search { query } => {
            let view = SearchView::new(state);
            view.set_query(&query.join(" "), cancel).await?;
            let model = view.snapshot().await;
            if model.results.is_empty() {
                println!("No novels found.");
            }
            for novel in &model.results {
                print_novel(novel, model.stats.get(&novel.id));
            }
        }
        Command::Novel { id, title } => {
            let view = NovelView::new(state, id, &title);
            let details = view.load(cancel).await?;
            let model = view.snapshot().await;
            print_novel(&details.novel, model.stats.as_ref());
            println!("\n{}", details.novel.description);
            println!("\nChapters:");
            for stub in &details.chapters {
                println!("  {:>3}. {}", stub.number, stub.name);
            }
            println!("\nComments:");
            for review in &model.reviews {
                println!("  {}: {}", review.author, review.text);
            }
        }
        Command::Read { id, title, chapter } => {
            let view = NovelView::new(state, id, &title);
            view.load(cancel).await?;
            let reader = view.reader();
            let chapter = match chapter {
                Some(number) => reader.select(number, cancel).await?,
                None => reader.first(cancel).await?,
            };
            match chapter {
                Some(chapter) => println!("Chapter {}: {}\n\n{}", chapter.number, chapter.name, chapter.content),
                None => println!("No such chapter."),
            }
        }
        Command::Booklist => {
            let view = BookListView::new(state);
            view.load(cancel).await?;
            for novel in &view.snapshot().await.novels {
                print_novel(novel, None);
            }
        }
        Command::Save { id } => set_saved(state, id, true, cancel).await?,
        Command::Unsave { id } => set_saved(state, id, false, cancel).await?,
        Command::Rate { id, title, value } => {
            let view = NovelView::new(state, id, &title);
            view.refresh_stats(cancel).await?;
            let stats = view.submit_rating(value, cancel).await?;
            println!("Average {:.1} over {} ratings.", stats.display_average(), stats.ratings_count);
        }
        Command::Comment { id, title, text } => {
            let view = NovelView::new(state, id, &title);
            let reviews = view.post_review(&text.join(" "), cancel).await?;
            println!("{} comments.", reviews.len());
        }
        Command::Profile { user_id } => {
            let user_id = match user_id {
                Some(id) => id,
                None => state.session.require()?.user_id,
            };
            let view = ProfileView::new(state, user_id);
            let profile = view.load(cancel).await?;
            println!("{} <{}> [{}]", profile.username, profile.email, profile.role);
            if let Some(bio) = &profile.bio {
                println!("{bio}");
            }
            if let Some(url) = view.snapshot().await.photo_url {
                println!("Photo: {url}");
            }
        }
        Command::EditProfile {
            username,
            email,
            bio,
        } => {
            let user_id = state.session.require()?.user_id;
            let view = ProfileView::new(state, user_id);
            let update = ProfileUpdate {
                username,
                email,
                bio: bio.unwrap_or_default(),
            };
            let profile = view.update(update, cancel).await?;
            println!("Profile saved for {}.", profile.username);
        }
        Command::Photo { path } => {
            let user_id = state.session.require()?.user_id;
            let photo = read_photo(&path).await?;
            let view = ProfileView::new(state, user_id);
            view.upload_photo(Some(photo), cancel).await?;
            if let Some(url) = view.snapshot().await.photo_url {
                println!("Photo: {url}");
            }
        }
        Command::Users => {
            let view = UserDirectory::new(state);
            view.load(cancel).await?;
            for user in &view.snapshot().await.users {
                println!("{:>5}  {}", user.user_id, user.username);
            }
        }
        Command::Watch => watch(state, cancel).await?,
    }
    Ok(())
}

async fn set_saved(
    state: ClientState,
    novel_id: u64,
    wants_saved: bool,
    cancel: &CancellationToken,
) -> Result<(), ClientError> {
    let saved = SavedNovels::new(state);
    saved.bootstrap(cancel).await?;
    if saved.is_saved(novel_id).await == wants_saved {
        println!("Nothing to do.");
        return Ok(());
    }
    let outcome = saved.toggle(novel_id, cancel).await?;
    let status = saved.snapshot().await.status;
    match (outcome, status.success) {
        (ToggleOutcome::AlreadyInFlight, _) => println!("Already updating."),
        (_, Some(message)) => println!("{message}"),
        (_, None) => {}
    }
    Ok(())
}

/// Follows session changes made by other `saga` processes until Ctrl-C.
async fn watch(state: ClientState, cancel: &CancellationToken) -> Result<(), ClientError> {
    let header = NavigationHeader::new(state.clone());
    let initial = header.navigate(cancel).await?;
    println!("{}", describe_header(initial.username.as_deref()));

    let mut events = state.events.subscribe();
    let header_task = header.clone().spawn(cancel.clone());
    let watcher = spawn_session_watcher(
        state.session.clone(),
        state.config.session_poll_interval,
        cancel.clone(),
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => {
                if event.is_err() {
                    break;
                }
                let session = state.session.current();
                println!("{}", describe_header(session.as_ref().map(|s| s.username.as_str())));
            }
        }
    }

    cancel.cancel();
    let (header_result, watcher_result) = tokio::join!(header_task, watcher);
    if let Err(e) = header_result {
        warn!(error = %e, "Header task ended abnormally");
    }
    if let Err(e) = watcher_result {
        warn!(error = %e, "Session watcher ended abnormally");
    }
    Ok(())
}

fn describe_header(username: Option<&str>) -> String {
    match username {
        Some(name) => format!("Signed in as {name}"),
        None => "Signed out".to_string(),
    }
}

fn print_novel(novel: &Novel, stats: Option<&NovelStats>) {
    match stats {
        Some(stats) => println!(
            "{:>5}  {} by {}  {} ({:.1}, {} views)",
            novel.id,
            novel.title,
            novel.author,
            stats.stars(),
            stats.display_average(),
            stats.view_count
        ),
        None => println!("{:>5}  {} by {}", novel.id, novel.title, novel.author),
    }
}

async fn read_photo(path: &Path) -> Result<PhotoUpload, ClientError> {
    let bytes = tokio::fs::read(path).await?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let mime_type = match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    };
    Ok(PhotoUpload {
        file_name: path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("photo")
            .to_string(),
        mime_type: mime_type.to_string(),
        bytes: Bytes::from(bytes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_outside_one_to_five_is_rejected_by_the_parser() {
        assert!(Cli::try_parse_from(["saga", "rate", "7", "Dune", "6"]).is_err());
        assert!(Cli::try_parse_from(["saga", "rate", "7", "Dune", "0"]).is_err());
        match Cli::try_parse_from(["saga", "rate", "7", "Dune", "5"]).unwrap().command {
            Command::Rate { id, title, value } => assert_eq!((id, title.as_str(), value), (7, "Dune", 5)),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn free_text_arguments_collect_every_word() {
        match Cli::try_parse_from(["saga", "comment", "3", "Dune", "loved", "it"]).unwrap().command {
            Command::Comment { text, .. } => assert_eq!(text.join(" "), "loved it"),
            other => panic!("unexpected command {other:?}"),
        }
        assert!(Cli::try_parse_from(["saga", "search"]).is_err());
    }

    #[test]
    fn ids_must_be_numeric() {
        assert!(Cli::try_parse_from(["saga", "save", "abc"]).is_err());
        assert!(matches!(
            Cli::try_parse_from(["saga", "edit-profile", "alice", "a@b.c"]).unwrap().command,
            Command::EditProfile { bio: None, .. }
        ));
    }
}
