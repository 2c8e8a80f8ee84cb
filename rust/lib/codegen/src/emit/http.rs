//! Plain HTTP server variant: one route per method, registered directly on
//! the runtime's mux. Handlers accept JSON or form bodies and always answer
//! with JSON.

use std::fmt;

use crate::binding::HttpVerb;
use crate::cw_line;
use crate::emit::{quote, trait_method, Generator};
use crate::table::{GeneratedMethod, GeneratedService, RoutingKey};
use crate::writer::CodeWriter;

pub struct HttpGenerator {
    /// Emit a `tracing::debug!` per handled request.
    pub tracing: bool,
}

impl Generator for HttpGenerator {
    fn name(&self) -> &str {
        "http"
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

        let routes: Vec<(&GeneratedMethod, HttpVerb, &str)> = service
            .methods
            .iter()
            .filter_map(|m| match &m.routing_key {
                RoutingKey::Http { verb, path } => Some((m, *verb, path.as_str())),
                _ => None,
            })
            .collect();

        w.line("#[allow(non_snake_case)]")?;
        w.block(
            &format!(
                "pub fn {}<S: {}>(mux: &mut {}::ServeMux, srv: ::std::sync::Arc<S>)",
                service.register_fn, service.impl_type, rt
            ),
            |w| {
                for (method, verb, path) in &routes {
                    w.delimited("{", "}", |w| {
                        w.line("let srv = ::std::sync::Arc::clone(&srv);")?;
                        cw_line!(
                            w,
                            "mux.handle({rt}::Method::{verb}, {path}, {rt}::error_handler(move |w, r| {handler}(&*srv, w, r)));",
                            rt = rt,
                            verb = verb,
                            path = quote(path),
                            handler = method.handler_name
                        )
                    })?;
                }
                Ok(())
            },
        )?;

        for (method, verb, path) in &routes {
            w.blank()?;
            self.generate_handler(w, rt, service, method, *verb, path)?;
        }
        Ok(())
    }
}

impl HttpGenerator {
    /// Verb check, body decode by content type, invoke, JSON encode. Every
    /// failure propagates to the runtime's error handler.
    fn generate_handler(
        &self,
        w: &mut CodeWriter,
        rt: &str,
        service: &GeneratedService,
        method: &GeneratedMethod,
        verb: HttpVerb,
        path: &str,
    ) -> fmt::Result {
        w.line("#[allow(non_snake_case)]")?;
        cw_line!(w, "fn {}<S: {}>(", method.handler_name, service.impl_type)?;
        w.indented(|w| {
            w.line("srv: &S,")?;
            cw_line!(w, "w: &mut {}::ResponseWriter,", rt)?;
            cw_line!(w, "r: &mut {}::Request,", rt)
        })?;
        w.delimited(&format!(") -> Result<(), {}::Error> {{", rt), "}", |w| {
            w.block(&format!("if r.method() != {}::Method::{}", rt, verb), |w| {
                cw_line!(w, "return Err({}::Error::msg(\"invalid http method\"));", rt)
            })?;

            cw_line!(
                w,
                "let req: {} = if r.header(\"Content-Type\") == Some(\"application/json\") {{",
                method.input
            )?;
            w.indented(|w| cw_line!(w, "{}::json::from_reader(r.body())?", rt))?;
            w.line("} else {")?;
            w.indented(|w| {
                w.line("r.parse_form()?;")?;
                cw_line!(w, "{}::form::decode(r.post_form())?", rt)
            })?;
            w.line("};")?;

            if self.tracing {
                cw_line!(
                    w,
                    "::tracing::debug!(path = {}, method = {}, \"handling request\");",
                    quote(path),
                    quote(verb.as_str())
                )?;
            }
            cw_line!(
                w,
                "let reply = srv.{}({}::Context::todo(), req)?;",
                method.rust_name,
                rt
            )?;
            cw_line!(w, "{}::json::to_writer(w, &reply)?;", rt)?;
            w.line("Ok(())")
        })
    }
}
