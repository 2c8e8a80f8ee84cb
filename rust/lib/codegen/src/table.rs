//! Dispatch table construction: the ordered list of bound methods that make
//! up one service descriptor.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::binding::{self, Binding, HttpVerb};
use crate::config::Variant;
use crate::context::FileContext;
use crate::error::{GenError, Result};
use crate::ir::{MethodDescriptor, ServiceDescriptor};
use crate::names::{snake_case, symbol_case};

/// Value the runtime uses to select a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingKey {
    MessageId(u32),
    Http {
        verb: HttpVerb,
        path: String,
    },
    Proxy {
        full_method: String,
        verb: HttpVerb,
        path: String,
    },
}

impl RoutingKey {
    /// The part of the key two methods of one service must not share.
    fn route(&self) -> String {
        match self {
            RoutingKey::MessageId(id) => format!("message id {}", id),
            RoutingKey::Http { verb, path } | RoutingKey::Proxy { verb, path, .. } => {
                format!("{} {}", verb, path)
            }
        }
    }
}

impl fmt::Display for RoutingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingKey::MessageId(id) => write!(f, "{}", id),
            RoutingKey::Http { verb, path } => write!(f, "{} {}", verb, path),
            RoutingKey::Proxy {
                full_method,
                verb,
                path,
            } => write!(f, "{} ({} {})", full_method, verb, path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedMethod {
    /// Name recorded in the descriptor.
    pub display_name: String,
    pub routing_key: RoutingKey,
    pub handler_name: String,
    /// Method name on the implementation trait.
    pub rust_name: String,
    pub input: String,
    pub output: String,
}

/// One-way message pushed by the server (rpc variant only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedNotify {
    pub rust_name: String,
    pub id: u32,
    pub input: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedService {
    pub name: String,
    /// `<namespace>.<Service>`, or the bare name without a namespace.
    pub full_name: String,
    /// Trait the registered implementation must satisfy.
    pub impl_type: String,
    pub register_fn: String,
    pub descriptor: String,
    pub methods: Vec<GeneratedMethod>,
    pub notifications: Vec<GeneratedNotify>,
}

impl GeneratedService {
    pub fn notify_trait(&self) -> String {
        format!("{}Notify", self.name)
    }

    pub fn notifier(&self) -> String {
        format!("{}Notifier", self.name)
    }

    pub fn notify_ctor(&self) -> String {
        format!("New{}Notify", self.name)
    }
}

/// Resolve every method of `service` and assemble its descriptor.
///
/// Methods the variant does not bind are left out entirely. Any resolution
/// failure aborts the build.
pub fn build(ctx: &mut FileContext<'_>, service: &ServiceDescriptor) -> Result<GeneratedService> {
    let variant = ctx.config.variant;
    let name = symbol_case(&service.name);
    let full_name = if ctx.namespace().is_empty() {
        service.name.clone()
    } else {
        format!("{}.{}", ctx.namespace(), service.name)
    };
    let owner = format!("service {}", service.name);

    let (impl_type, register_fn, descriptor) = match variant {
        Variant::Proxy => (
            format!("{}Client", name),
            ctx.names
                .claim(format!("Register{}GrpcHttpProxyServer", name), owner.as_str())?,
            ctx.names
                .claim(format!("_{}_grpcHttpProxyServiceDesc", name), owner.as_str())?,
        ),
        _ => (
            ctx.names.claim(format!("{}Server", name), owner.as_str())?,
            ctx.names.claim(format!("Register{}Server", name), owner.as_str())?,
            ctx.names.claim(format!("_{}_serviceDesc", name), owner.as_str())?,
        ),
    };

    let mut methods = Vec::new();
    let mut notifications = Vec::new();
    let mut routes: HashMap<String, String> = HashMap::new();
    let mut notify_ids: HashMap<u32, String> = HashMap::new();

    for method in &service.method {
        let binding = binding::resolve(ctx, service, method)?;

        if variant == Variant::Rpc && method.is_notify() {
            if let Binding::MessageId { id } = binding {
                let route = format!("notify id {}", id);
                check_unique(&mut notify_ids, id, ctx, &full_name, &route, &method.name)?;
                notifications.push(GeneratedNotify {
                    rust_name: snake_case(&method.name),
                    id,
                    input: ctx.rust_type(&method.input_type)?,
                });
                continue;
            }
        }

        let routing_key = match binding {
            Binding::Unbound => {
                debug!(service = %service.name, method = %method.name, "no http rule, skipping");
                continue;
            }
            Binding::MessageId { id } => RoutingKey::MessageId(id),
            Binding::Http { verb, path } if variant == Variant::Proxy => RoutingKey::Proxy {
                full_method: format!("{}/{}", full_name, method.name),
                verb,
                path,
            },
            Binding::Http { verb, path } => RoutingKey::Http { verb, path },
        };

        let route = routing_key.route();
        check_unique(&mut routes, route.clone(), ctx, &full_name, &route, &method.name)?;

        debug!(service = %full_name, method = %method.name, key = %routing_key, "bound");
        let generated = generate_method(ctx, &name, method, routing_key)?;
        methods.push(generated);
    }

    let generated = GeneratedService {
        name,
        full_name,
        impl_type,
        register_fn,
        descriptor,
        methods,
        notifications,
    };
    if !generated.notifications.is_empty() {
        ctx.names.claim(generated.notify_trait(), owner.as_str())?;
        ctx.names.claim(generated.notifier(), owner.as_str())?;
        ctx.names.claim(generated.notify_ctor(), owner.as_str())?;
    }

    debug!(
        service = %generated.full_name,
        methods = generated.methods.len(),
        notifications = generated.notifications.len(),
        "built dispatch table"
    );
    Ok(generated)
}

fn generate_method(
    ctx: &mut FileContext<'_>,
    service_name: &str,
    method: &MethodDescriptor,
    routing_key: RoutingKey,
) -> Result<GeneratedMethod> {
    let method_name = symbol_case(&method.name);
    let handler = match ctx.config.variant {
        Variant::Proxy => format!("_{}_{}_GrpcHttpProxyHandler", service_name, method_name),
        _ => format!("_{}_{}_Handler", service_name, method_name),
    };
    let handler_name = ctx
        .names
        .claim(handler, format!("method {}.{}", service_name, method.name))?;

    let display_name = match &routing_key {
        RoutingKey::Proxy { full_method, .. } => full_method.clone(),
        _ => method.name.clone(),
    };

    Ok(GeneratedMethod {
        display_name,
        routing_key,
        handler_name,
        rust_name: snake_case(&method.name),
        input: ctx.rust_type(&method.input_type)?,
        output: ctx.rust_type(&method.output_type)?,
    })
}

fn check_unique<K: std::hash::Hash + Eq>(
    seen: &mut HashMap<K, String>,
    key: K,
    ctx: &FileContext<'_>,
    service: &str,
    route: &str,
    method: &str,
) -> Result<()> {
    if let Some(first) = seen.get(&key) {
        return Err(GenError::DuplicateRoute {
            file: ctx.file.name.clone(),
            service: service.to_string(),
            route: route.to_string(),
            first: first.clone(),
            second: method.to_string(),
        });
    }
    seen.insert(key, method.to_string());
    Ok(())
}
