//! Page access engine.
//!
//! Decides who may view and edit pages in the page tree. Decisions are pure
//! functions over [`PageAccess`] snapshots loaded by [`queries`]; mutations
//! go through [`queries`] as well so that grant invariants are enforced in
//! one place.

pub mod ancestors;
pub mod editor;
pub mod error;
pub mod evaluator;
pub mod inheritance;
pub mod models;
pub mod queries;
pub mod session;

pub use gp_common::{Principal, Role, RoleRequirement, SessionContext};

pub use ancestors::{can_view_with_ancestors, first_denied, is_well_formed};
pub use editor::{can_create_in_chain, can_create_under, can_edit_in_editor};
pub use error::{AccessError, AccessResult, Invariant, Missing};
pub use evaluator::{can_edit, can_view, edit_grant, view_step, EditGrant, EvalGuard, GuardToken, ViewStep};
pub use inheritance::{plan_inherited_grants, CopiedGrants, InheritedGrants};
pub use models::{Document, NewDocument, NewPage, Page, PageAccess, PageDetail, PageMemberGrant};
pub use session::is_bypass_session;
