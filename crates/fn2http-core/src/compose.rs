//! Parameter-set merging, decorator composition, and flattening.
//!
//! Decorators are explicit, finite composition steps: each contributes a set
//! of injected parameters plus optional pre/post hooks, and composing one
//! onto a callable yields a new callable whose discoverable signature
//! includes the injected parameters. Flattening merges several callables
//! into one composite calling convention keyed by a dispatch parameter.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{BuildError, HandlerError};
use crate::signature::{
    ArgMap, CallArgs, CallOutput, Callable, ParamKind, Parameter, Signature, TypeHint, introspect,
};

/// Policy for resolving a name collision when merging parameter sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnCollision {
    /// Last writer wins: the incoming parameter replaces the existing one.
    #[default]
    Replace,
    /// First writer wins: the incoming parameter is dropped.
    KeepFirst,
    /// Any collision is an error.
    Fail,
}

fn collision_error(name: &str, message: impl Into<String>) -> BuildError {
    BuildError::ParameterCollision {
        name: name.to_string(),
        message: message.into(),
    }
}

fn reject_variadic(param: &Parameter, context: &str) -> Result<(), BuildError> {
    if param.kind.is_variadic() {
        return Err(BuildError::UnsupportedParameterKind {
            name: param.name.clone(),
            kind: format!("{} ({context})", param.kind.as_str()),
        });
    }
    Ok(())
}

/// Merge a parameter set into a signature.
///
/// Existing names are updated in place (declaration order preserved), new
/// names are appended. A `reserved` parameter on either side turns any
/// collision into an error regardless of policy. Merging an empty set
/// returns an equal signature; merging a signature's own parameters under
/// [`OnCollision::Replace`] is idempotent.
pub fn add_parameter_set(
    signature: &Signature,
    new_params: &[Parameter],
    on_collision: OnCollision,
) -> Result<Signature, BuildError> {
    let mut params: Vec<Parameter> = signature.params().to_vec();

    for incoming in new_params {
        reject_variadic(incoming, "cannot be injected")?;
        match params.iter().position(|p| p.name == incoming.name) {
            Some(index) => {
                let existing = &params[index];
                if existing.reserved || incoming.reserved {
                    return Err(collision_error(
                        &incoming.name,
                        "parameter is reserved and cannot be redefined",
                    ));
                }
                match on_collision {
                    OnCollision::Replace => params[index] = incoming.clone(),
                    OnCollision::KeepFirst => {}
                    OnCollision::Fail => {
                        return Err(collision_error(
                            &incoming.name,
                            "already defined and collision policy is 'fail'",
                        ));
                    }
                }
            }
            None => params.push(incoming.clone()),
        }
    }

    signature.with_params(params)
}

/// Swap named parameters in from a source signature, preserving the target's
/// order. Fails with [`BuildError::ParameterNotFound`] when a requested name
/// is absent from either side, and refuses variadic swaps.
pub fn replace_parameters(
    target: &Signature,
    source: &Signature,
    names: &[&str],
) -> Result<Signature, BuildError> {
    let mut params: Vec<Parameter> = target.params().to_vec();

    for &name in names {
        let replacement = source.get(name).ok_or_else(|| BuildError::ParameterNotFound {
            name: name.to_string(),
        })?;
        reject_variadic(replacement, "cannot replace a parameter")?;

        let index = params
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| BuildError::ParameterNotFound {
                name: name.to_string(),
            })?;
        reject_variadic(&params[index], "cannot be replaced")?;
        params[index] = replacement.clone();
    }

    target.with_params(params)
}

type PreHook = Arc<dyn Fn(&mut CallArgs, &ArgMap) -> Result<(), HandlerError> + Send + Sync>;
type PostHook = Arc<dyn Fn(CallOutput, &ArgMap) -> Result<CallOutput, HandlerError> + Send + Sync>;

/// One composition step: injected parameters plus optional hooks.
///
/// The pre hook runs before invocation and may edit the full argument map;
/// the post hook maps the raw output. Both receive the decorator's own
/// argument values (defaults filled).
#[derive(Clone)]
pub struct Decorator {
    name: String,
    params: Vec<Parameter>,
    on_collision: OnCollision,
    pre: Option<PreHook>,
    post: Option<PostHook>,
}

impl Decorator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            on_collision: OnCollision::Replace,
            pre: None,
            post: None,
        }
    }

    /// Add a parameter this decorator injects into the composite signature.
    pub fn inject(mut self, param: Parameter) -> Self {
        self.params.push(param);
        self
    }

    /// Set the collision policy used when merging injected parameters.
    pub fn on_collision(mut self, policy: OnCollision) -> Self {
        self.on_collision = policy;
        self
    }

    /// Hook run before the inner callable, with the decorator's own argument
    /// values. May edit the argument map.
    pub fn before<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut CallArgs, &ArgMap) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.pre = Some(Arc::new(hook));
        self
    }

    /// Hook run on the inner callable's output.
    pub fn after<F>(mut self, hook: F) -> Self
    where
        F: Fn(CallOutput, &ArgMap) -> Result<CallOutput, HandlerError> + Send + Sync + 'static,
    {
        self.post = Some(Arc::new(hook));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }
}

impl std::fmt::Debug for Decorator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decorator")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A decorator that injects one literal-constrained parameter and rejects
/// invocations whose value falls outside the allowed set.
pub fn literal_guard(param: Parameter) -> Decorator {
    let name = param.name.clone();
    let hint = param.hint.clone();
    Decorator::new(format!("literal_guard({name})"))
        .inject(param)
        .before(move |_, own| {
            if let (Some(TypeHint::Literal(allowed)), Some(value)) = (&hint, own.get(&name))
                && !allowed.contains(value)
            {
                return Err(HandlerError::invalid_input(format!(
                    "argument '{name}' is not one of the allowed values"
                )));
            }
            Ok(())
        })
}

/// A decorator that checks the output against a type hint, failing the
/// request when the callable returns a different shape.
pub fn coerce_output(hint: TypeHint) -> Decorator {
    Decorator::new("coerce_output").after(move |output, _| match &output {
        CallOutput::Json(value) if !hint.admits(value) => Err(HandlerError::internal(format!(
            "return value does not match declared {} shape",
            hint.describe()
        ))),
        _ => Ok(output),
    })
}

/// A callable produced by [`decorate`]: the inner callable plus one
/// decorator, with the merged signature precomputed at build time.
pub struct Decorated {
    inner: Arc<dyn Callable>,
    inner_signature: Signature,
    signature: Signature,
    decorator: Decorator,
}

impl Decorated {
    fn own_args(&self, args: &CallArgs) -> ArgMap {
        let mut own = ArgMap::new();
        for param in &self.decorator.params {
            if let Some(value) = args.keyword.get(&param.name) {
                own.insert(param.name.clone(), value.clone());
            } else if let Some(default) = &param.default {
                own.insert(param.name.clone(), default.clone());
            }
        }
        own
    }
}

impl Callable for Decorated {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn signature(&self) -> Option<&Signature> {
        Some(&self.signature)
    }

    fn attrs(&self) -> &ArgMap {
        self.inner.attrs()
    }

    fn call(&self, args: &CallArgs) -> Result<CallOutput, HandlerError> {
        let own = self.own_args(args);

        let mut full = args.clone();
        for (key, value) in &own {
            full.keyword.entry(key.clone()).or_insert_with(|| value.clone());
        }
        if let Some(pre) = &self.decorator.pre {
            pre(&mut full, &own)?;
        }

        // Strip arguments that belong to the decorator alone
        let mut inner_args = full;
        for param in &self.decorator.params {
            if !self.inner_signature.contains(&param.name) {
                inner_args.keyword.remove(&param.name);
            }
        }

        let output = self.inner.call(&inner_args)?;
        match &self.decorator.post {
            Some(post) => post(output, &own),
            None => Ok(output),
        }
    }
}

/// Compose a decorator around a callable.
///
/// The result's discoverable signature is the inner signature merged with the
/// decorator's injected parameters under the decorator's collision policy.
pub fn decorate(
    inner: Arc<dyn Callable>,
    decorator: Decorator,
) -> Result<Arc<dyn Callable>, BuildError> {
    let inner_signature = introspect(inner.as_ref())?;
    let signature = add_parameter_set(&inner_signature, &decorator.params, decorator.on_collision)?;
    Ok(Arc::new(Decorated {
        inner,
        inner_signature,
        signature,
        decorator,
    }))
}

/// An ordered decorator pipeline.
///
/// Applying an empty stack returns the callable unchanged.
#[derive(Clone, Default)]
pub struct DecoratorStack {
    decorators: Vec<Decorator>,
}

impl DecoratorStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, decorator: Decorator) -> Self {
        self.decorators.push(decorator);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.decorators.is_empty()
    }

    /// Fold the stack over a callable, innermost decorator first.
    pub fn apply(self, callable: Arc<dyn Callable>) -> Result<Arc<dyn Callable>, BuildError> {
        let mut current = callable;
        for decorator in self.decorators {
            current = decorate(current, decorator)?;
        }
        Ok(current)
    }
}

/// One member of a flattened composite.
#[derive(Clone)]
pub struct FlattenMember {
    pub name: String,
    pub callable: Arc<dyn Callable>,
}

impl FlattenMember {
    pub fn new(name: impl Into<String>, callable: Arc<dyn Callable>) -> Self {
        Self {
            name: name.into(),
            callable,
        }
    }
}

/// Options for [`flatten`].
#[derive(Debug, Clone)]
pub struct FlattenOptions {
    /// Name of the injected dispatch-key parameter.
    pub key_param: String,
    /// Remaps (member, param) to an exposed name, resolving collisions.
    renames: HashMap<(String, String), String>,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            key_param: "_method".to_string(),
            renames: HashMap::new(),
        }
    }
}

impl FlattenOptions {
    pub fn key_param(mut self, name: impl Into<String>) -> Self {
        self.key_param = name.into();
        self
    }

    /// Expose `member`'s parameter `param` under a different name.
    pub fn rename(
        mut self,
        member: impl Into<String>,
        param: impl Into<String>,
        exposed: impl Into<String>,
    ) -> Self {
        self.renames
            .insert((member.into(), param.into()), exposed.into());
        self
    }
}

struct FlatMember {
    callable: Arc<dyn Callable>,
    /// (exposed name, member-internal name) pairs for this member's subset.
    bindings: Vec<(String, String)>,
}

/// A composite callable built by [`flatten`]. Dispatches on the key
/// parameter and re-invokes the selected member with its argument subset.
pub struct FlatEndpoint {
    name: String,
    key_param: String,
    signature: Signature,
    members: Vec<(String, FlatMember)>,
}

impl FlatEndpoint {
    /// Names of the flattened members, in declaration order.
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|(name, _)| name.as_str())
    }
}

impl Callable for FlatEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> Option<&Signature> {
        Some(&self.signature)
    }

    fn call(&self, args: &CallArgs) -> Result<CallOutput, HandlerError> {
        let key = args
            .require(&self.key_param)?
            .as_str()
            .ok_or_else(|| {
                HandlerError::invalid_input(format!("argument '{}' must be a string", self.key_param))
            })?
            .to_string();

        let member = self
            .members
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, member)| member)
            .ok_or_else(|| HandlerError::invalid_input(format!("unknown member '{key}'")))?;

        let mut subset = ArgMap::new();
        for (exposed, internal) in &member.bindings {
            if let Some(value) = args.keyword.get(exposed) {
                subset.insert(internal.clone(), value.clone());
            }
        }
        member.callable.call(&CallArgs::from_keywords(subset))
    }
}

/// Merge several callables into one composite calling convention.
///
/// The composite signature is the injected key parameter (a `Literal` over
/// member names), the shared `init_params`, then the union of member
/// parameters. Identical colliding definitions deduplicate; differing ones
/// fail with [`BuildError::ParameterCollision`] unless a rename resolves
/// them. Variadic parameters are not eligible for flattening.
pub fn flatten(
    name: impl Into<String>,
    init_params: &[Parameter],
    members: Vec<FlattenMember>,
    options: FlattenOptions,
) -> Result<FlatEndpoint, BuildError> {
    let name = name.into();
    let member_names: Vec<Value> = members
        .iter()
        .map(|m| Value::String(m.name.clone()))
        .collect();

    let key = Parameter::required(&options.key_param)
        .hint(TypeHint::Literal(member_names))
        .reserved();
    let mut union: Vec<Parameter> = vec![key];

    for param in init_params {
        reject_variadic(param, "cannot be flattened")?;
        if union.iter().any(|p| p.name == param.name) {
            return Err(collision_error(&param.name, "collides with the dispatch key"));
        }
        // The composite addresses everything by name
        let mut exposed = param.clone();
        exposed.kind = ParamKind::PositionalOrKeyword;
        union.push(exposed);
    }

    let mut flat_members: Vec<(String, FlatMember)> = Vec::new();
    for member in members {
        if flat_members.iter().any(|(n, _)| *n == member.name) {
            return Err(collision_error(&member.name, "duplicate member name"));
        }
        let signature = introspect(member.callable.as_ref())?;
        let mut bindings = Vec::new();

        for param in signature.params() {
            reject_variadic(param, "cannot be flattened")?;
            let exposed_name = options
                .renames
                .get(&(member.name.clone(), param.name.clone()))
                .cloned()
                .unwrap_or_else(|| param.name.clone());

            let mut exposed = param.clone();
            exposed.name = exposed_name.clone();
            // Keyword ordering constraints don't survive a union; every
            // member argument is addressed by name in the composite.
            exposed.kind = ParamKind::PositionalOrKeyword;

            match union.iter().find(|p| p.name == exposed_name) {
                Some(existing) if *existing == exposed => {}
                Some(_) => {
                    return Err(collision_error(
                        &exposed_name,
                        format!(
                            "member '{}' defines it differently; supply a rename to resolve",
                            member.name
                        ),
                    ));
                }
                None => union.push(exposed),
            }
            bindings.push((exposed_name, param.name.clone()));
        }

        flat_members.push((
            member.name.clone(),
            FlatMember {
                callable: member.callable,
                bindings,
            },
        ));
    }

    // Required members of the union must precede defaulted ones; reorder
    // (stably) rather than reject, since member order is arbitrary here.
    let key_and_required: Vec<Parameter> = union
        .iter()
        .filter(|p| p.is_required())
        .cloned()
        .collect();
    let defaulted: Vec<Parameter> = union
        .iter()
        .filter(|p| !p.is_required())
        .cloned()
        .collect();
    let mut ordered = key_and_required;
    ordered.extend(defaulted);

    Ok(FlatEndpoint {
        name,
        key_param: options.key_param,
        signature: Signature::new(ordered)?,
        members: flat_members,
    })
}
