pub mod domain;
pub mod endpoints;
pub mod messages;
pub mod navigation;
pub mod ports;
pub mod sequence;

pub use domain::{
    Chapter, ChapterStub, Credentials, LoginOutcome, Novel, NovelDetails, NovelId, NovelStats,
    PhotoUpload, ProfileUpdate, ProfileUpdateOutcome, Rating, Registration, Review, Session,
    UserId, UserProfile,
};
pub use endpoints::{ApiBase, Endpoint, IDENTITY_HEADER};
pub use navigation::{ChapterCursor, ChapterMove};
pub use ports::{KeyValueStore, NovelBackend, PortError, PortResult, StoreMutation};
pub use sequence::{RequestSequencer, RequestToken};
