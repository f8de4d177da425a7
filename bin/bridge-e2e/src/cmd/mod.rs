pub(crate) mod admin;
pub(crate) mod common;
pub(crate) mod events;
pub(crate) mod execute_proposal;
pub(crate) mod pause;
pub(crate) mod setup;
pub(crate) mod status;
pub(crate) mod xcm;
