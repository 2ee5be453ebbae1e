pub mod provisioner;
pub mod query;
pub mod service;
pub mod updater;

#[cfg(test)]
mod test_support;

pub use provisioner::PreferenceProvisioner;
pub use query::{AllowedTypes, InboxQuery, InboxView};
pub use service::InboxService;
pub use updater::PreferenceUpdater;
