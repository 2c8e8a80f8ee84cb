//! gRPC-to-HTTP proxy variant. Each bound method forwards a decoded request
//! to the service's client trait; the descriptor carries the verb and path
//! the proxy runtime mounts it on. The client trait itself comes from the
//! gRPC code generator, so nothing here declares it.

use std::fmt;

use crate::cw_line;
use crate::emit::{quote, Generator};
use crate::table::{GeneratedMethod, GeneratedService, RoutingKey};
use crate::writer::CodeWriter;

pub struct ProxyGenerator;

impl Generator for ProxyGenerator {
    fn name(&self) -> &str {
        "grpc_http_proxy"
    }

    fn generate_service(
        &self,
        w: &mut CodeWriter,
        rt: &str,
        service: &GeneratedService,
    ) -> fmt::Result {
        cw_line!(w, "// HTTP proxy for {} service", service.full_name)?;

        for method in &service.methods {
            w.blank()?;
            generate_handler(w, rt, service, method)?;
        }

        w.blank()?;
        w.line("#[allow(non_snake_case)]")?;
        w.block(
            &format!(
                "pub fn {}<C: {}>(s: &mut {}::Server, srv: C)",
                service.register_fn, service.impl_type, rt
            ),
            |w| cw_line!(w, "s.register_service({}::<C>(), srv);", service.descriptor),
        )?;

        w.blank()?;
        generate_descriptor(w, rt, service)
    }
}

fn generate_handler(
    w: &mut CodeWriter,
    rt: &str,
    service: &GeneratedService,
    method: &GeneratedMethod,
) -> fmt::Result {
    w.line("#[allow(non_snake_case)]")?;
    cw_line!(w, "fn {}<C: {}>(", method.handler_name, service.impl_type)?;
    w.indented(|w| {
        w.line("srv: &C,")?;
        cw_line!(w, "ctx: {}::Context,", rt)?;
        cw_line!(w, "dec: &dyn {}::Decoder<{}>,", rt, method.input)
    })?;
    w.delimited(
        &format!(") -> Result<{}, {}::Error> {{", method.output, rt),
        "}",
        |w| {
            w.line("let req = dec.decode()?;")?;
            cw_line!(w, "srv.{}(ctx, req)", method.rust_name)
        },
    )
}

fn generate_descriptor(w: &mut CodeWriter, rt: &str, service: &GeneratedService) -> fmt::Result {
    w.line("#[allow(non_snake_case)]")?;
    w.block(
        &format!(
            "fn {}<C: {}>() -> {}::ServiceDesc<C>",
            service.descriptor, service.impl_type, rt
        ),
        |w| {
            w.delimited(&format!("{}::ServiceDesc {{", rt), "}", |w| {
                cw_line!(w, "service_name: {},", quote(&service.full_name))?;
                cw_line!(w, "handler_type: {},", quote(&service.impl_type))?;
                w.delimited("methods: vec![", "],", |w| {
                    for method in &service.methods {
                        if let RoutingKey::Proxy { verb, path, .. } = &method.routing_key {
                            w.delimited(&format!("{}::MethodDesc {{", rt), "},", |w| {
                                cw_line!(w, "method_name: {},", quote(&method.display_name))?;
                                cw_line!(
                                    w,
                                    "handler: {}::Handler::new({}::<C>),",
                                    rt,
                                    method.handler_name
                                )?;
                                cw_line!(w, "http_method: {}::Method::{},", rt, verb)?;
                                cw_line!(w, "http_path: {},", quote(path))
                            })?;
                        }
                    }
                    Ok(())
                })
            })
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::HttpVerb;

    fn method(name: &str, verb: HttpVerb, path: &str) -> GeneratedMethod {
        GeneratedMethod {
            display_name: format!("api.Foo/{}", name),
            routing_key: RoutingKey::Proxy {
                full_method: format!("api.Foo/{}", name),
                verb,
                path: path.into(),
            },
            handler_name: format!("_Foo_{}_GrpcHttpProxyHandler", name),
            rust_name: name.to_lowercase(),
            input: "Req".into(),
            output: "Resp".into(),
        }
    }

    fn render() -> String {
        let service = GeneratedService {
            name: "Foo".into(),
            full_name: "api.Foo".into(),
            impl_type: "FooClient".into(),
            register_fn: "RegisterFooGrpcHttpProxyServer".into(),
            descriptor: "_Foo_grpcHttpProxyServiceDesc".into(),
            methods: vec![
                method("Get", HttpVerb::Get, "/foo/{id}"),
                method("Remove", HttpVerb::Delete, "/foo/{id}"),
            ],
            notifications: Vec::new(),
        };
        let mut w = CodeWriter::new();
        ProxyGenerator.generate_service(&mut w, "proxy", &service).unwrap();
        w.into_string()
    }

    #[test]
    fn test_handlers_come_first() {
        let out = render();
        let get = out.find("fn _Foo_Get_GrpcHttpProxyHandler").unwrap();
        let remove = out.find("fn _Foo_Remove_GrpcHttpProxyHandler").unwrap();
        let register = out.find("pub fn RegisterFooGrpcHttpProxyServer").unwrap();
        let desc = out.find("fn _Foo_grpcHttpProxyServiceDesc").unwrap();
        assert!(get < remove && remove < register && register < desc);

        assert!(out.contains(
            "fn _Foo_Get_GrpcHttpProxyHandler<C: FooClient>(\n    srv: &C,\n    ctx: proxy::Context,\n    dec: &dyn proxy::Decoder<Req>,\n) -> Result<Resp, proxy::Error> {\n    let req = dec.decode()?;\n    srv.get(ctx, req)\n}\n"
        ));
        assert!(out.contains(
            "pub fn RegisterFooGrpcHttpProxyServer<C: FooClient>(s: &mut proxy::Server, srv: C) {\n    s.register_service(_Foo_grpcHttpProxyServiceDesc::<C>(), srv);\n}\n"
        ));
    }

    #[test]
    fn test_descriptor_entries() {
        let out = render();
        let expected = "\
#[allow(non_snake_case)]
fn _Foo_grpcHttpProxyServiceDesc<C: FooClient>() -> proxy::ServiceDesc<C> {
    proxy::ServiceDesc {
        service_name: \"api.Foo\",
        handler_type: \"FooClient\",
        methods: vec![
            proxy::MethodDesc {
                method_name: \"api.Foo/Get\",
                handler: proxy::Handler::new(_Foo_Get_GrpcHttpProxyHandler::<C>),
                http_method: proxy::Method::GET,
                http_path: \"/foo/{id}\",
            },
            proxy::MethodDesc {
                method_name: \"api.Foo/Remove\",
                handler: proxy::Handler::new(_Foo_Remove_GrpcHttpProxyHandler::<C>),
                http_method: proxy::Method::DELETE,
                http_path: \"/foo/{id}\",
            },
        ],
    }
}
";
        assert!(out.ends_with(expected), "{}", out);
    }
}
