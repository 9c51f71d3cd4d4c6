//! Vine monitor engine: session handling, page fetching, extraction,
//! notification and persistence around the pure `vine_core` domain.
mod auth;
mod clock;
mod decode;
mod digest;
mod extract;
mod fetch;
mod monitor;
mod notify;
mod persist;
mod session;
mod site;
mod snapshot;
mod store;
mod terms;
mod types;

pub use auth::{cookie_header_from_netscape, AuthError, Authenticator, CookieAuthenticator, CookieSource};
pub use clock::{utc_clock, Clock, Sleeper, TokioSleeper};
pub use decode::decode_page;
pub use digest::ContentDigest;
pub use extract::{ItemParser, TileParser};
pub use fetch::{build_client, FetchSettings, PageSource, ReqwestPageSource, Session};
pub use monitor::{
    CycleOutcome, CycleReport, Monitor, MonitorParts, MonitorSettings, StartupError,
};
pub use notify::{build_embed, Destinations, DiscordNotifier, Notifier};
pub use persist::{ensure_output_dir, write_atomic, PersistError};
pub use session::{SessionController, SessionError};
pub use site::{is_signin_url, SiteUrls};
pub use snapshot::{FetchFailure, FetcherSettings, QueueFetch, SnapshotFetcher};
pub use store::{render, LoadError, StateStore, DEFAULT_STATE_FILE};
pub use terms::{load_priority_terms, read_terms, write_sample_terms, TermsError, DEFAULT_TERMS_FILE};
pub use types::{FailureKind, FetchError, Page};
