#![doc = "cyrus-docs-core: core logic library for cyrus-docs."]

//! This crate contains the site build pipeline for the Cyrus IMAP
//! documentation: source tables, process execution, and the sync, build,
//! assemble and publish stages. The `cyrus-docs` binary is only CLI glue
//! around [`pipeline::build_site`].
//!
//! # Usage
//! Construct a [`pipeline::SiteBuildConfig`], pick a
//! [`contract::CommandRunner`] (normally [`command::SystemRunner`]) and call
//! [`pipeline::build_site`].

pub mod assemble;
pub mod command;
pub mod config;
pub mod contract;
pub mod docbuild;
pub mod error;
pub mod layout;
pub mod pipeline;
pub mod publish;
pub mod repository;
