//! The access-control pipeline: one enforcement step composing loaders,
//! the permission manager, and an error handler.
//!
//! Evaluation is a fixed linear sequence: resolve the agent, resolve the
//! target, check the permission. The first failure stops the pipeline,
//! invokes the error handler with exactly one [`DenialCode`], and the
//! protected operation never runs. What the handler does with the code
//! (abort, redirect, log) is entirely the caller's concern.

use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::errors::PermbaseResult;
use crate::loader::{Loader, RequestParams};
use crate::manager::{PermissionBackend, PermissionManager};
use crate::record::Record;

/// Why a request was denied. Renders as the wire name
/// (`agent_not_found`, `target_not_found`, `forbidden`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DenialCode {
    AgentNotFound,
    TargetNotFound,
    Forbidden,
}

/// Outcome of one pipeline evaluation.
pub enum Verdict {
    Granted {
        agent: Arc<dyn Record>,
        target: Arc<dyn Record>,
    },
    Denied(DenialCode),
}

/// A reusable guard around any protected operation.
#[derive(TypedBuilder)]
pub struct AccessControl<'a, B: PermissionBackend> {
    manager: &'a PermissionManager<B>,
    #[builder(setter(into))]
    permission: String,
    agent_loader: &'a dyn Loader,
    target_loader: &'a dyn Loader,
    on_denied: &'a dyn Fn(DenialCode),
}

impl<'a, B: PermissionBackend> AccessControl<'a, B> {
    /// Run the checks without invoking the error handler or any operation.
    ///
    /// Loader and manager failures propagate as errors; a clean denial is
    /// `Ok(Verdict::Denied(_))`.
    pub fn evaluate(&self, params: &RequestParams) -> PermbaseResult<Verdict> {
        let Some(agent) = self.agent_loader.load(params)? else {
            return Ok(Verdict::Denied(DenialCode::AgentNotFound));
        };
        let Some(target) = self.target_loader.load(params)? else {
            return Ok(Verdict::Denied(DenialCode::TargetNotFound));
        };
        if !self
            .manager
            .has_permission(&*agent, &*target, &self.permission)?
        {
            return Ok(Verdict::Denied(DenialCode::Forbidden));
        }
        Ok(Verdict::Granted { agent, target })
    }

    /// Guard one invocation of a protected operation.
    ///
    /// On the success path the operation receives the resolved agent and
    /// target alongside the original parameters and its result is returned
    /// as `Some`. On denial the error handler runs and the result is `None`.
    pub fn guard<R>(
        &self,
        params: &RequestParams,
        operation: impl FnOnce(Arc<dyn Record>, Arc<dyn Record>, &RequestParams) -> R,
    ) -> PermbaseResult<Option<R>> {
        match self.evaluate(params)? {
            Verdict::Granted { agent, target } => Ok(Some(operation(agent, target, params))),
            Verdict::Denied(code) => {
                debug!("denied '{}': {}", self.permission, code);
                (self.on_denied)(code);
                Ok(None)
            }
        }
    }

    /// Middleware form: turn a handler into a guarded handler.
    pub fn wrap<R, F>(&self, operation: F) -> impl Fn(&RequestParams) -> PermbaseResult<Option<R>>
    where
        F: Fn(Arc<dyn Record>, Arc<dyn Record>, &RequestParams) -> R,
    {
        move |params| self.guard(params, &operation)
    }
}
