// Application layer - Use case interactors

pub mod api;
pub mod cache_interactor;
pub mod compress_interactor;
pub mod container;
pub mod inspect_interactor;

// Re-export interactors
pub use api::{Ports, VideoCompressor};
pub use cache_interactor::CacheInteractor;
pub use compress_interactor::{CompressInteractor, JobHandle, JobRegistry};
pub use container::{AppContainer, DefaultAppContainer};
pub use inspect_interactor::InspectInteractor;
