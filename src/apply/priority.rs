//! Precedence tiers for configuration element kinds
//!
//! Lower tiers apply earlier for creates and updates; deletes run through
//! the mirror ordering (highest first) so children are gone before their
//! parents. The table is fixed at compile time and never mutated.
//!
//! Invariants the tests pin down: every child kind sits strictly above its
//! parent's tier, and rule kinds (which reference ACLs and backends by
//! name) sit above every other child of the same section.

/// Standalone sections nothing else must precede: global, defaults,
/// userlist, ring, log-forward, fcgi-app, program, crt-store, cache,
/// http-errors
pub const SECTION: u8 = 10;

/// Sections referenced by proxies (peers, resolvers, mailers); they must
/// exist before a frontend or backend can point at them
pub const LINKED_SECTION: u8 = 15;

/// Frontends and backends
pub const PROXY: u8 = 30;

/// Named children: binds, servers, server templates, nameservers, peer
/// entries, users, mailer entries, tables
pub const CHILD: u8 = 40;

/// ACLs; referenced by rules, so they precede them
pub const ACL: u8 = 50;

/// Every rule kind, plus filters, log targets, captures and checks
pub const RULE: u8 = 60;
