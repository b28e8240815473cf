use nada_mir_core::FunctionId;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::errors::CompileError;
use crate::hir::{compile_hir, HirProgram};

fn program(body: serde_json::Value) -> String {
    body.to_string()
}

fn tables() -> serde_json::Value {
    json!({
        "parties": [{"name": "Party1", "source_ref": {"file": "main.py", "lineno": 3, "offset": 0, "length": 20}}],
        "inputs": [
            {"name": "a", "party": "Party1", "type": "SecretInteger", "doc": "first operand"},
            {"name": "b", "party": "Party1", "type": "SecretInteger"}
        ]
    })
}

fn with_outputs(outputs: serde_json::Value) -> String {
    let mut doc = tables();
    doc["outputs"] = outputs;
    program(doc)
}

#[test]
fn test_compile_simple_program() {
    let json = with_outputs(json!([{
        "name": "sum",
        "party": "Party1",
        "inner": {
            "op": "Addition",
            "left": {"op": "InputReference", "input": 0},
            "right": {"op": "InputReference", "input": 1},
            "source_ref": {"file": "main.py", "lineno": 7, "offset": 40, "length": 5}
        }
    }]));

    let mir = compile_hir(&json).unwrap();

    assert_eq!(mir.inputs.len(), 2);
    assert_eq!(mir.inputs[0].doc, "first operand");
    assert_eq!(mir.outputs[0].name, "sum");
    assert_eq!(
        serde_json::to_value(&mir.outputs[0].inner).unwrap()["Addition"]["right"],
        json!({"InputReference": {"refers_to": "b", "type": {"Secret": {"Integer": null}}}})
    );
    assert_eq!(mir.source_files, vec!["main.py"]);
}

#[test]
fn test_unknown_operation_is_rejected() {
    let json = with_outputs(json!([{
        "name": "out",
        "party": "Party1",
        "inner": {"op": "IfElse", "inner": {"op": "InputReference", "input": 0}}
    }]));

    let err = compile_hir(&json).unwrap_err();
    assert!(matches!(err, CompileError::UnsupportedOperation(ref kind) if kind == "IfElse"));
    insta::assert_snapshot!(err.to_string(), @"Compilation of Operation IfElse not supported");
}

#[test]
fn test_missing_operand_is_reported() {
    let json = with_outputs(json!([{
        "name": "out",
        "party": "Party1",
        "inner": {"op": "Multiplication", "left": {"op": "InputReference", "input": 0}}
    }]));

    let err = compile_hir(&json).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"Missing required field: right in Multiplication");
}

#[test]
fn test_duplicate_input_entries() {
    let mut doc = tables();
    doc["inputs"]
        .as_array_mut()
        .unwrap()
        .push(json!({"name": "a", "party": "Party1", "type": "SecretInteger"}));
    doc["outputs"] = json!([{
        "name": "out",
        "party": "Party1",
        "inner": {
            "op": "Addition",
            "left": {"op": "InputReference", "input": 0},
            "right": {"op": "InputReference", "input": 2}
        }
    }]);

    let err = compile_hir(&program(doc)).unwrap_err();
    assert!(matches!(err, CompileError::DuplicateInput { ref name, .. } if name == "a"));
}

#[test]
fn test_unknown_party_and_input() {
    let json = program(json!({
        "parties": [],
        "inputs": [{"name": "a", "party": "Ghost", "type": "SecretInteger"}],
        "outputs": []
    }));
    assert!(matches!(
        HirProgram::from_json(&json).unwrap().to_outputs(),
        Err(CompileError::UnknownParty(ref name)) if name == "Ghost"
    ));

    let json = with_outputs(json!([{
        "name": "out",
        "party": "Party1",
        "inner": {"op": "InputReference", "input": 9}
    }]));
    assert!(matches!(
        compile_hir(&json),
        Err(CompileError::UnknownInput(9))
    ));
}

#[test]
fn test_invalid_type_name() {
    let json = program(json!({
        "parties": [{"name": "Party1"}],
        "inputs": [{"name": "a", "party": "Party1", "type": "SecretFloat"}],
        "outputs": []
    }));

    let err = compile_hir(&json).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"Unknown type: SecretFloat");
}

#[test]
fn test_ill_typed_graph_is_rejected() {
    let json = with_outputs(json!([{
        "name": "out",
        "party": "Party1",
        "inner": {
            "op": "Addition",
            "left": {"op": "InputReference", "input": 0},
            "right": {"op": "Literal", "value": true, "type": "Boolean"}
        }
    }]));

    assert!(matches!(compile_hir(&json), Err(CompileError::Graph(_))));
}

#[test]
fn test_functions_resolve_in_any_table_order() {
    let mut doc = json!({
        "parties": [{"name": "Party1"}],
        "inputs": [{
            "name": "matrix",
            "party": "Party1",
            "type": {"Array": {"inner_type": {"Array": {"inner_type": "SecretInteger", "size": 2}}, "size": 2}}
        }],
        "functions": [
            {
                "id": 20,
                "function": "inc_all",
                "args": [{"name": "row", "type": {"Array": {"inner_type": "SecretInteger", "size": 2}}}],
                "return_type": {"Array": {"inner_type": "SecretInteger", "size": 2}},
                "inner": {"op": "Map", "fn": 10, "inner": {"op": "NadaFunctionArgRef", "refers_to": "row"}}
            },
            {
                "id": 10,
                "function": "inc",
                "args": [{"name": "x", "type": "SecretInteger"}],
                "return_type": "SecretInteger",
                "inner": {
                    "op": "Addition",
                    "left": {"op": "NadaFunctionArgRef", "refers_to": "x"},
                    "right": {"op": "Literal", "value": "1", "type": "Integer"}
                }
            }
        ]
    });
    doc["outputs"] = json!([{
        "name": "out",
        "party": "Party1",
        "inner": {"op": "Map", "fn": 20, "inner": {"op": "InputReference", "input": 0}}
    }]);

    let mir = compile_hir(&program(doc)).unwrap();

    let ids: Vec<FunctionId> = mir.functions.iter().map(|f| f.id).collect();
    assert_eq!(ids, vec![FunctionId(20), FunctionId(10)]);

    let inc = mir.function(FunctionId(10)).unwrap();
    assert_eq!(
        serde_json::to_value(&inc.inner).unwrap()["Addition"]["left"],
        json!({"NadaFunctionArgRef": {
            "function_id": 10,
            "refers_to": "x",
            "type": {"Secret": {"Integer": null}}
        }})
    );
}

#[test]
fn test_recursive_function_is_rejected() {
    let json = program(json!({
        "parties": [{"name": "Party1"}],
        "inputs": [{"name": "xs", "party": "Party1", "type": {"Vector": {"inner_type": "SecretInteger"}}}],
        "functions": [{
            "id": 1,
            "function": "loop",
            "args": [{"name": "v", "type": {"Vector": {"inner_type": "SecretInteger"}}}],
            "return_type": {"Vector": {"inner_type": "SecretInteger"}},
            "inner": {"op": "Map", "fn": 1, "inner": {"op": "NadaFunctionArgRef", "refers_to": "v"}}
        }],
        "outputs": [{
            "name": "out",
            "party": "Party1",
            "inner": {"op": "Map", "fn": 1, "inner": {"op": "InputReference", "input": 0}}
        }]
    }));

    assert!(matches!(
        compile_hir(&json),
        Err(CompileError::RecursiveFunction(FunctionId(1)))
    ));
}

#[test]
fn test_argument_reference_outside_function() {
    let json = with_outputs(json!([{
        "name": "out",
        "party": "Party1",
        "inner": {"op": "NadaFunctionArgRef", "refers_to": "x"}
    }]));

    assert!(matches!(
        compile_hir(&json),
        Err(CompileError::UnknownArgument(ref name)) if name == "x"
    ));
}

#[test]
fn test_literals_and_casts() {
    let json = with_outputs(json!([
        {
            "name": "scaled",
            "party": "Party1",
            "inner": {
                "op": "Multiplication",
                "left": {"op": "InputReference", "input": 0},
                "right": {"op": "Literal", "value": "123456789012345678901234567890", "type": "Integer"}
            }
        },
        {
            "name": "unsigned",
            "party": "Party1",
            "inner": {"op": "Cast", "to": "SecretUnsignedInteger", "target": {"op": "InputReference", "input": 1}}
        }
    ]));

    let mir = compile_hir(&json).unwrap();
    let scaled = serde_json::to_value(&mir.outputs[0].inner).unwrap();
    assert_eq!(
        scaled["Multiplication"]["right"]["Literal"]["value"],
        json!("123456789012345678901234567890")
    );

    let unsigned = serde_json::to_value(&mir.outputs[1]).unwrap();
    assert_eq!(unsigned["type"], json!({"Secret": {"UnsignedInteger": null}}));
    assert_eq!(unsigned["inner"]["Cast"]["to"], json!("SecretUnsignedInteger"));
}

#[test]
fn test_invalid_literal() {
    let json = with_outputs(json!([{
        "name": "out",
        "party": "Party1",
        "inner": {"op": "Literal", "value": "twelve", "type": "Integer"}
    }]));

    let err = compile_hir(&json).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"Invalid literal twelve for type Integer");
}

#[test]
fn test_duplicate_function_ids() {
    let function = json!({
        "id": 3,
        "function": "f",
        "args": [{"name": "x", "type": "SecretInteger"}],
        "return_type": "SecretInteger",
        "inner": {"op": "NadaFunctionArgRef", "refers_to": "x"}
    });
    let mut doc = tables();
    doc["functions"] = json!([function.clone(), function]);
    doc["outputs"] = json!([]);

    assert!(matches!(
        HirProgram::from_json(&program(doc)).unwrap().to_outputs(),
        Err(CompileError::DuplicateFunction(FunctionId(3)))
    ));
}

#[test]
fn test_secret_rational_input_without_digits() {
    let json = program(json!({
        "parties": [{"name": "Party1"}],
        "inputs": [{"name": "price", "party": "Party1", "type": "SecretRational"}],
        "outputs": []
    }));

    let err = compile_hir(&json).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"SecretRational requires a digit count");
}

#[test]
fn test_secret_rational_input_with_digits() {
    let json = program(json!({
        "parties": [{"name": "Party1"}],
        "inputs": [{"name": "price", "party": "Party1", "type": {"SecretRational": {"digits": 2}}}],
        "outputs": [{
            "name": "out",
            "party": "Party1",
            "inner": {"op": "InputReference", "input": 0}
        }]
    }));

    let mir = compile_hir(&json).unwrap();
    assert_eq!(
        serde_json::to_value(&mir.inputs[0].ty).unwrap(),
        json!({"Secret": {"Rational": {"digits": 2}}})
    );
}

#[test]
fn test_cast_to_secret_rational_needs_digits() {
    let cast = |digits: Option<u32>| {
        let mut node = json!({
            "op": "Cast",
            "to": "SecretRational",
            "target": {"op": "InputReference", "input": 0}
        });
        if let Some(digits) = digits {
            node["digits"] = json!(digits);
        }
        with_outputs(json!([{"name": "out", "party": "Party1", "inner": node}]))
    };

    let err = compile_hir(&cast(None)).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"SecretRational requires a digit count");

    let mir = compile_hir(&cast(Some(3))).unwrap();
    let output = serde_json::to_value(&mir.outputs[0]).unwrap();
    assert_eq!(output["type"], json!({"Secret": {"Rational": {"digits": 3}}}));
    assert_eq!(output["inner"]["Cast"]["to"], json!("SecretRational"));
}

fn reloaded(json: &str) -> serde_json::Value {
    let outputs = HirProgram::from_json(json).unwrap().to_outputs().unwrap();
    let dumped = HirProgram::from_outputs(&outputs).unwrap();
    serde_json::from_str(&dumped.to_json().unwrap()).unwrap()
}

#[test]
fn test_dump_round_trips_through_loader() {
    let json = program(json!({
        "parties": [
            {"name": "Alice", "source_ref": {"file": "main.py", "lineno": 1, "offset": 0, "length": 5}},
            {"name": "Bob", "source_ref": {"file": "main.py", "lineno": 2, "offset": 6, "length": 3}}
        ],
        "inputs": [
            {"name": "rows", "party": "Alice", "type": {"Array": {"inner_type": {"Array": {"inner_type": "SecretInteger", "size": 2}}, "size": 2}}},
            {"name": "rate", "party": "Bob", "type": {"SecretRational": {"digits": 2}}, "doc": "interest"},
            {"name": "bias", "party": "Bob", "type": "SecretInteger"}
        ],
        "functions": [
            {
                "id": 1,
                "function": "shift",
                "args": [{"name": "x", "type": "SecretInteger"}],
                "return_type": "SecretInteger",
                "inner": {
                    "op": "Addition",
                    "left": {"op": "NadaFunctionArgRef", "refers_to": "x"},
                    "right": {"op": "InputReference", "input": 2}
                }
            },
            {
                "id": 2,
                "function": "shift_all",
                "args": [{"name": "row", "type": {"Array": {"inner_type": "SecretInteger", "size": 2}}}],
                "return_type": {"Array": {"inner_type": "SecretInteger", "size": 2}},
                "inner": {"op": "Map", "fn": 1, "inner": {"op": "NadaFunctionArgRef", "refers_to": "row"}}
            }
        ],
        "outputs": [
            {
                "name": "shifted",
                "party": "Alice",
                "inner": {"op": "Map", "fn": 2, "inner": {"op": "InputReference", "input": 0}}
            },
            {
                "name": "scaled",
                "party": "Bob",
                "inner": {
                    "op": "Multiplication",
                    "left": {"op": "InputReference", "input": 1},
                    "right": {"op": "Literal", "value": "150", "type": "Rational", "digits": 2},
                    "source_ref": {"file": "main.py", "lineno": 9, "offset": 80, "length": 11}
                }
            },
            {
                "name": "flag",
                "party": "Bob",
                "inner": {
                    "op": "Cast",
                    "to": "SecretUnsignedInteger",
                    "target": {"op": "InputReference", "input": 2}
                }
            }
        ]
    }));

    let first = reloaded(&json);
    let second = reloaded(&first.to_string());
    assert_eq!(first, second);

    assert_eq!(
        compile_hir(&first.to_string()).unwrap(),
        compile_hir(&json).unwrap()
    );
    // Nested functions and the inputs their bodies read are numbered first.
    let ids: Vec<&serde_json::Value> = first["functions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|function| &function["id"])
        .collect();
    assert_eq!(ids, vec![&json!(1), &json!(2)]);
    assert_eq!(first["inputs"][0]["name"], json!("bias"));

    let rate = first["inputs"]
        .as_array()
        .unwrap()
        .iter()
        .find(|input| input["name"] == "rate")
        .unwrap();
    assert_eq!(rate["type"], json!({"SecretRational": {"digits": 2}}));
    assert_eq!(rate["doc"], json!("interest"));
    assert_eq!(
        first["outputs"][1]["inner"]["right"],
        json!({
            "op": "Literal",
            "value": "150",
            "type": "Rational",
            "digits": 2,
            "source_ref": {"file": "<unknown>", "lineno": 0, "offset": 0, "length": 0}
        })
    );
}

#[test]
fn test_dump_shares_one_entry_per_input_instance() {
    let json = with_outputs(json!([
        {"name": "o1", "party": "Party1", "inner": {"op": "InputReference", "input": 1}},
        {"name": "o2", "party": "Party1", "inner": {
            "op": "Addition",
            "left": {"op": "InputReference", "input": 1},
            "right": {"op": "InputReference", "input": 1}
        }}
    ]));

    let dumped = reloaded(&json);

    assert_eq!(dumped["inputs"].as_array().unwrap().len(), 1);
    assert_eq!(dumped["inputs"][0]["name"], json!("b"));
    assert_eq!(dumped["outputs"][1]["inner"]["left"]["input"], json!(0));
}
