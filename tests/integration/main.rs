//! Integration tests for the Memberhub session lifecycle core.

mod helpers;

mod access_test;
mod lifecycle_test;
mod role_test;
