//! Test modules for sceneopt-backup
//!
//! Behavioural tests of the snapshot store against in-memory storage and an
//! in-memory project host.
