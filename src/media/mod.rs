pub mod attach;
pub mod folder_match;
pub mod natural;
pub mod slug;

pub use attach::{attach_images, list_images, AttachedImage};
pub use folder_match::{CandidateFolder, FolderIndex};
pub use slug::site_slug;
