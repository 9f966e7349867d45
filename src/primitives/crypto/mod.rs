/// Group trait and operations.
pub mod group;

pub use group::Group;
