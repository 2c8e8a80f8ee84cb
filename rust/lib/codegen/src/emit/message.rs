//! Message-id dispatch (`rpc` and `message` variants).
//!
//! The emitted shape, for a service `Order` with one method `Create`:
//!
//! ```text
//! pub trait OrderServer: Send + Sync + 'static { fn create(...) }
//! pub fn RegisterOrderServer<S: OrderServer>(s: &mut rpc::Server, srv: S)
//! fn _Order_Create_Handler<S: OrderServer>(srv, ctx, dec) -> Result<Resp, rpc::Error>
//! fn _Order_serviceDesc<S: OrderServer>() -> rpc::ServiceDesc<S>
//! ```
//!
//! Handlers are plain generic functions; `rpc::Handler::new` captures the
//! concrete request and response types when the descriptor is built, so the
//! runtime never recovers types dynamically.

use std::fmt;

use crate::cw_line;
use crate::emit::{quote, trait_method, Generator};
use crate::table::{GeneratedMethod, GeneratedService, RoutingKey};
use crate::writer::CodeWriter;

pub struct MessageIdGenerator;

impl Generator for MessageIdGenerator {
    fn name(&self) -> &str {
        "message-id"
    }

    fn generate_service(
        &self,
        w: &mut CodeWriter,
        rt: &str,
        service: &GeneratedService,
    ) -> fmt::Result {
        cw_line!(w, "// Server API for {} service", service.name)?;
        w.blank()?;

        w.block(
            &format!("pub trait {}: Send + Sync + 'static", service.impl_type),
            |w| {
                for method in &service.methods {
                    trait_method(w, rt, &method.rust_name, &method.input, &method.output)?;
                }
                Ok(())
            },
        )?;
        w.blank()?;

        if !service.notifications.is_empty() {
            generate_notify(w, rt, service)?;
        }

        w.line("#[allow(non_snake_case)]")?;
        w.block(
            &format!(
                "pub fn {}<S: {}>(s: &mut {}::Server, srv: S)",
                service.register_fn, service.impl_type, rt
            ),
            |w| cw_line!(w, "s.register_service({}::<S>(), srv);", service.descriptor),
        )?;

        for method in &service.methods {
            w.blank()?;
            generate_handler(w, rt, service, method)?;
        }

        w.blank()?;
        generate_descriptor(w, rt, service)
    }
}

/// Decode into a fresh request, call the implementation, hand its result
/// back unchanged. A decode failure returns immediately.
fn generate_handler(
    w: &mut CodeWriter,
    rt: &str,
    service: &GeneratedService,
    method: &GeneratedMethod,
) -> fmt::Result {
    w.line("#[allow(non_snake_case)]")?;
    cw_line!(w, "fn {}<S: {}>(", method.handler_name, service.impl_type)?;
    w.indented(|w| {
        w.line("srv: &S,")?;
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
            "fn {}<S: {}>() -> {}::ServiceDesc<S>",
            service.descriptor, service.impl_type, rt
        ),
        |w| {
            w.delimited(&format!("{}::ServiceDesc {{", rt), "}", |w| {
                cw_line!(w, "service_name: {},", quote(&service.name))?;
                cw_line!(w, "handler_type: {},", quote(&service.impl_type))?;
                w.delimited("methods: vec![", "],", |w| {
                    for method in &service.methods {
                        w.delimited(&format!("{}::MethodDesc {{", rt), "},", |w| {
                            cw_line!(w, "method_name: {},", quote(&method.display_name))?;
                            if let RoutingKey::MessageId(id) = &method.routing_key {
                                cw_line!(w, "method_id: {},", id)?;
                            }
                            cw_line!(
                                w,
                                "handler: {}::Handler::new({}::<S>),",
                                rt,
                                method.handler_name
                            )
                        })?;
                    }
                    Ok(())
                })
            })
        },
    )
}

/// One-way pushes: a trait, a context-holding notifier and its constructor.
fn generate_notify(w: &mut CodeWriter, rt: &str, service: &GeneratedService) -> fmt::Result {
    let notify_trait = service.notify_trait();
    let notifier = service.notifier();

    w.comment("Notify")?;
    w.block(&format!("pub trait {}", notify_trait), |w| {
        for notify in &service.notifications {
            cw_line!(
                w,
                "fn {}(&self, req: &{}) -> Result<(), {}::Error>;",
                notify.rust_name,
                notify.input,
                rt
            )?;
        }
        Ok(())
    })?;
    w.blank()?;

    w.block(&format!("pub struct {}", notifier), |w| {
        cw_line!(w, "ctx: {}::Context,", rt)
    })?;
    w.blank()?;

    w.line("#[allow(non_snake_case)]")?;
    w.block(
        &format!(
            "pub fn {}(ctx: {}::Context) -> {}",
            service.notify_ctor(),
            rt,
            notifier
        ),
        |w| cw_line!(w, "{} {{ ctx }}", notifier),
    )?;
    w.blank()?;

    w.block(&format!("impl {} for {}", notify_trait, notifier), |w| {
        for (i, notify) in service.notifications.iter().enumerate() {
            if i > 0 {
                w.blank()?;
            }
            w.block(
                &format!(
                    "fn {}(&self, req: &{}) -> Result<(), {}::Error>",
                    notify.rust_name, notify.input, rt
                ),
                |w| cw_line!(w, "{}::notify(&self.ctx, {}, req)", rt, notify.id),
            )?;
        }
        Ok(())
    })?;
    w.blank()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::GeneratedNotify;

    fn order() -> GeneratedService {
        GeneratedService {
            name: "Order".into(),
            full_name: "shop.Order".into(),
            impl_type: "OrderServer".into(),
            register_fn: "RegisterOrderServer".into(),
            descriptor: "_Order_serviceDesc".into(),
            methods: vec![GeneratedMethod {
                display_name: "Create".into(),
                routing_key: RoutingKey::MessageId(42),
                handler_name: "_Order_Create_Handler".into(),
                rust_name: "create".into(),
                input: "CreateReq".into(),
                output: "CreateResp".into(),
            }],
            notifications: Vec::new(),
        }
    }

    fn render(service: &GeneratedService) -> String {
        let mut w = CodeWriter::new();
        MessageIdGenerator.generate_service(&mut w, "rpc", service).unwrap();
        w.into_string()
    }

    #[test]
    fn test_service_surface() {
        let out = render(&order());
        assert!(out.starts_with("// Server API for Order service\n"));
        assert!(out.contains(
            "pub trait OrderServer: Send + Sync + 'static {\n    fn create(&self, ctx: rpc::Context, req: CreateReq) -> Result<CreateResp, rpc::Error>;\n}\n"
        ));
        assert!(out.contains(
            "pub fn RegisterOrderServer<S: OrderServer>(s: &mut rpc::Server, srv: S) {\n    s.register_service(_Order_serviceDesc::<S>(), srv);\n}\n"
        ));
        assert!(!out.contains("Notify"));
    }

    #[test]
    fn test_handler_body() {
        let out = render(&order());
        let expected = "\
#[allow(non_snake_case)]
fn _Order_Create_Handler<S: OrderServer>(
    srv: &S,
    ctx: rpc::Context,
    dec: &dyn rpc::Decoder<CreateReq>,
) -> Result<CreateResp, rpc::Error> {
    let req = dec.decode()?;
    srv.create(ctx, req)
}
";
        assert!(out.contains(expected), "{}", out);
    }

    #[test]
    fn test_descriptor() {
        let out = render(&order());
        let expected = "\
#[allow(non_snake_case)]
fn _Order_serviceDesc<S: OrderServer>() -> rpc::ServiceDesc<S> {
    rpc::ServiceDesc {
        service_name: \"Order\",
        handler_type: \"OrderServer\",
        methods: vec![
            rpc::MethodDesc {
                method_name: \"Create\",
                method_id: 42,
                handler: rpc::Handler::new(_Order_Create_Handler::<S>),
            },
        ],
    }
}
";
        assert!(out.ends_with(expected), "{}", out);
    }

    #[test]
    fn test_notify_block() {
        let mut service = order();
        service.notifications.push(GeneratedNotify {
            rust_name: "changed".into(),
            id: 7,
            input: "OrderChanged".into(),
        });
        let out = render(&service);

        assert!(out.contains(
            "pub trait OrderNotify {\n    fn changed(&self, req: &OrderChanged) -> Result<(), rpc::Error>;\n}\n"
        ));
        assert!(out.contains("pub struct OrderNotifier {\n    ctx: rpc::Context,\n}\n"));
        assert!(out.contains(
            "pub fn NewOrderNotify(ctx: rpc::Context) -> OrderNotifier {\n    OrderNotifier { ctx }\n}\n"
        ));
        assert!(out.contains("        rpc::notify(&self.ctx, 7, req)\n"));
        assert!(!out.contains("method_name: \"Changed\""));
    }
}
