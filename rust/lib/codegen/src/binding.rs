//! Per-method transport binding resolution.

use std::fmt;

use tracing::{debug, warn};

use crate::config::Variant;
use crate::context::FileContext;
use crate::error::{GenError, Result};
use crate::ir::{HttpRule, MethodDescriptor, ServiceDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HttpVerb {
    Get,
    Put,
    Post,
    Delete,
    Patch,
}

impl HttpVerb {
    /// Resolution order. The first populated field wins.
    pub const PRIORITY: [HttpVerb; 5] = [
        HttpVerb::Get,
        HttpVerb::Put,
        HttpVerb::Post,
        HttpVerb::Delete,
        HttpVerb::Patch,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HttpVerb::Get => "GET",
            HttpVerb::Put => "PUT",
            HttpVerb::Post => "POST",
            HttpVerb::Delete => "DELETE",
            HttpVerb::Patch => "PATCH",
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl HttpRule {
    pub fn path(&self, verb: HttpVerb) -> &str {
        match verb {
            HttpVerb::Get => &self.get,
            HttpVerb::Put => &self.put,
            HttpVerb::Post => &self.post,
            HttpVerb::Delete => &self.delete,
            HttpVerb::Patch => &self.patch,
        }
    }

    /// Populated `(verb, path)` pairs in priority order.
    pub fn populated(&self) -> impl Iterator<Item = (HttpVerb, &str)> {
        HttpVerb::PRIORITY
            .into_iter()
            .map(move |verb| (verb, self.path(verb)))
            .filter(|(_, path)| !path.is_empty())
    }
}

/// Resolved transport routing for one method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// No transport metadata. Only the proxy variant tolerates this.
    Unbound,
    Http { verb: HttpVerb, path: String },
    MessageId { id: u32 },
}

/// Resolve the binding of `method` under the context's variant.
pub fn resolve(
    ctx: &FileContext<'_>,
    service: &ServiceDescriptor,
    method: &MethodDescriptor,
) -> Result<Binding> {
    let method_ref = format!("{}.{}", service.name, method.name);
    let binding = match ctx.config.variant {
        Variant::Rpc => resolve_direct_id(ctx, &method_ref, method)?,
        Variant::Message => resolve_api_id(ctx, &method_ref, method)?,
        Variant::Http => match method.http_rule() {
            Some(rule) => resolve_http(ctx, &method_ref, rule)?,
            None => {
                return Err(GenError::NoHttpMethod {
                    file: ctx.file.name.clone(),
                    method: method_ref,
                })
            }
        },
        Variant::Proxy => match method.http_rule() {
            Some(rule) => resolve_http(ctx, &method_ref, rule)?,
            None => Binding::Unbound,
        },
    };
    debug!(method = %method_ref, ?binding, "resolved binding");
    Ok(binding)
}

/// First populated verb in `GET, PUT, POST, DELETE, PATCH` order. Extra
/// verbs are ignored with a warning.
pub fn resolve_http(ctx: &FileContext<'_>, method_ref: &str, rule: &HttpRule) -> Result<Binding> {
    let mut populated = rule.populated();
    let (verb, path) = populated.next().ok_or_else(|| GenError::NoHttpMethod {
        file: ctx.file.name.clone(),
        method: method_ref.to_string(),
    })?;

    let ignored: Vec<HttpVerb> = populated.map(|(verb, _)| verb).collect();
    if !ignored.is_empty() {
        warn!(
            file = %ctx.file.name,
            method = %method_ref,
            chosen = %verb,
            ?ignored,
            "multiple http verbs set, only the highest priority one is used"
        );
    }

    Ok(Binding::Http {
        verb,
        path: path.to_string(),
    })
}

fn resolve_direct_id(
    ctx: &FileContext<'_>,
    method_ref: &str,
    method: &MethodDescriptor,
) -> Result<Binding> {
    let id = method.declared_id().ok_or_else(|| GenError::MissingMessageId {
        file: ctx.file.name.clone(),
        method: method_ref.to_string(),
    })?;
    Ok(Binding::MessageId { id })
}

/// Look the id up as member `E_<RequestType>` of the file's `api` enum.
fn resolve_api_id(
    ctx: &FileContext<'_>,
    method_ref: &str,
    method: &MethodDescriptor,
) -> Result<Binding> {
    let type_name = ctx.schema_name(&method.input_type)?;
    let member_name = format!("E_{}", type_name);

    let member = ctx
        .file
        .api_enum()
        .and_then(|api| api.member(&member_name))
        .ok_or_else(|| GenError::UnknownApiId {
            file: ctx.file.name.clone(),
            method: method_ref.to_string(),
            type_name: type_name.clone(),
        })?;

    let id = u32::try_from(member.number).map_err(|_| GenError::InvalidApiId {
        file: ctx.file.name.clone(),
        member: member_name,
        number: member.number,
    })?;
    Ok(Binding::MessageId { id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::ir::FileDescriptor;
    use crate::types::TypeIndex;

    fn file() -> FileDescriptor {
        serde_json::from_value(serde_json::json!({
            "name": "game.proto",
            "package": "game",
            "message_type": [
                {"name": "LoginReq"}, {"name": "LoginResp"},
                {"name": "LogoutReq"}, {"name": "BadReq"}, {"name": "HTTPLoginReq"}
            ],
            "enum_type": [{
                "name": "api",
                "value": [
                    {"name": "E_LoginReq", "number": 1001},
                    {"name": "E_BadReq", "number": -1},
                    {"name": "E_HTTPLoginReq", "number": 1003}
                ]
            }],
            "service": [{
                "name": "Game",
                "method": [
                    {"name": "Login", "input_type": ".game.LoginReq", "output_type": ".game.LoginResp",
                     "options": {"id": 12}},
                    {"name": "Logout", "input_type": ".game.LogoutReq", "output_type": ".game.LoginResp"},
                    {"name": "Bad", "input_type": ".game.BadReq", "output_type": ".game.LoginResp"},
                    {"name": "HttpLogin", "input_type": ".game.HTTPLoginReq", "output_type": ".game.LoginResp"}
                ]
            }]
        }))
        .unwrap()
    }

    fn rule(get: &str, put: &str, post: &str, delete: &str, patch: &str) -> HttpRule {
        HttpRule {
            get: get.into(),
            put: put.into(),
            post: post.into(),
            delete: delete.into(),
            patch: patch.into(),
        }
    }

    fn with_ctx<T>(variant: Variant, f: impl FnOnce(&FileContext<'_>, &ServiceDescriptor) -> T) -> T {
        let file = file();
        let types = TypeIndex::build(std::slice::from_ref(&file));
        let config = GeneratorConfig::for_variant(variant);
        let ctx = FileContext::new(&file, &config, &types);
        f(&ctx, &file.service[0])
    }

    #[test]
    fn test_http_priority_order() {
        with_ctx(Variant::Http, |ctx, _| {
            let cases = [
                (rule("/g", "/u", "/p", "/d", "/a"), HttpVerb::Get, "/g"),
                (rule("", "/u", "/p", "/d", "/a"), HttpVerb::Put, "/u"),
                (rule("", "", "/p", "/d", "/a"), HttpVerb::Post, "/p"),
                (rule("", "", "", "/d", "/a"), HttpVerb::Delete, "/d"),
                (rule("", "", "", "", "/a"), HttpVerb::Patch, "/a"),
            ];
            for (rule, verb, path) in cases {
                assert_eq!(
                    resolve_http(ctx, "Game.Login", &rule).unwrap(),
                    Binding::Http {
                        verb,
                        path: path.to_string()
                    }
                );
            }
        });
    }

    #[test]
    fn test_http_without_verb_fails() {
        with_ctx(Variant::Http, |ctx, _| {
            let err = resolve_http(ctx, "Game.Login", &HttpRule::default()).unwrap_err();
            assert_eq!(err.to_string(), "game.proto: Game.Login: no http method matches");
        });
    }

    #[test]
    fn test_http_variant_requires_rule() {
        with_ctx(Variant::Http, |ctx, service| {
            assert!(matches!(
                resolve(ctx, service, &service.method[0]),
                Err(GenError::NoHttpMethod { .. })
            ));
        });
    }

    #[test]
    fn test_proxy_variant_tolerates_missing_rule() {
        with_ctx(Variant::Proxy, |ctx, service| {
            assert_eq!(resolve(ctx, service, &service.method[0]).unwrap(), Binding::Unbound);

            let mut method = service.method[0].clone();
            method.options.as_mut().unwrap().http = Some(HttpRule::default());
            assert!(matches!(
                resolve(ctx, service, &method),
                Err(GenError::NoHttpMethod { .. })
            ));
        });
    }

    #[test]
    fn test_direct_id() {
        with_ctx(Variant::Rpc, |ctx, service| {
            assert_eq!(
                resolve(ctx, service, &service.method[0]).unwrap(),
                Binding::MessageId { id: 12 }
            );
            assert!(matches!(
                resolve(ctx, service, &service.method[1]),
                Err(GenError::MissingMessageId { .. })
            ));
        });
    }

    #[test]
    fn test_api_enum_id() {
        with_ctx(Variant::Message, |ctx, service| {
            assert_eq!(
                resolve(ctx, service, &service.method[0]).unwrap(),
                Binding::MessageId { id: 1001 }
            );

            let err = resolve(ctx, service, &service.method[1]).unwrap_err();
            assert!(matches!(err, GenError::UnknownApiId { ref type_name, .. } if type_name == "LogoutReq"));

            assert!(matches!(
                resolve(ctx, service, &service.method[2]),
                Err(GenError::InvalidApiId { number: -1, .. })
            ));

            assert_eq!(
                resolve(ctx, service, &service.method[3]).unwrap(),
                Binding::MessageId { id: 1003 }
            );
        });
    }

    #[test]
    fn test_api_enum_missing() {
        let mut file = file();
        file.enum_type.clear();
        let types = TypeIndex::build(std::slice::from_ref(&file));
        let config = GeneratorConfig::for_variant(Variant::Message);
        let ctx = FileContext::new(&file, &config, &types);
        let service = &file.service[0];
        assert!(matches!(
            resolve(&ctx, service, &service.method[0]),
            Err(GenError::UnknownApiId { .. })
        ));
    }
}
