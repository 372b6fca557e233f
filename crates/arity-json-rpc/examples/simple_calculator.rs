//! Simple Calculator Dispatch Example
//!
//! Builds a registry from one calculator unit and drives a few flat-parameter
//! requests straight through the dispatcher, printing each rendered envelope.
//! No transport involved; this is the core pipeline on its own.

use std::collections::HashMap;
use std::sync::Arc;

use arity_json_rpc::{
    Dispatcher, MethodRegistry, ParamType, RpcConfig, RpcRequest, RpcResponse, UnitBuilder,
};
use serde_json::json;

fn main() {
    let calculator = UnitBuilder::new("calculator")
        .static_method(
            "add",
            &[ParamType::Float, ParamType::Float],
            "float",
            |args| Ok(json!(args.float(0)? + args.float(1)?)),
        )
        .static_method(
            "sub",
            &[ParamType::Float, ParamType::Float],
            "float",
            |args| Ok(json!(args.float(0)? - args.float(1)?)),
        )
        .build();

    let config = RpcConfig::default().with_units(["calculator"]);
    let registry = match MethodRegistry::build(&[calculator], &config) {
        Ok(registry) => Arc::new(registry),
        Err(err) => {
            eprintln!("registry build failed: {}", err);
            return;
        }
    };
    let dispatcher = Dispatcher::new(registry, config.expose_methods);

    let calls: [&[(&str, &str)]; 4] = [
        &[("id", "1"), ("method", "add"), ("params", "[2, 3]")],
        &[("id", "2"), ("method", "sub"), ("params", "[10, 4.5]")],
        &[("id", "3"), ("method", "add"), ("params", r#"["x", 3]"#)],
        &[("id", "4")],
    ];

    for pairs in calls {
        let flat: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let mut response = RpcResponse::new();
        match RpcRequest::from_flat(&flat) {
            Ok(request) => {
                if let Some(id) = request.id() {
                    response.set_id(id);
                }
                match dispatcher.dispatch(&request) {
                    Ok(result) => response.set_result(result),
                    Err(err) => response.set_error(err.to_error_object()),
                }
            }
            Err(err) => response.set_error(err.to_error_object()),
        }
        println!("{}", response.render(false));
    }
}
