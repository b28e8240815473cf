use nada_mir_core::{MirOutput, MirProgram, Output};
use tracing::{debug, info};

use crate::context::CompilationContext;
use crate::errors::Result;
use crate::lowering::{lower_function, lower_operation};
use crate::reify::reify;

/// Compiles a program's outputs into a MIR document using a fresh context.
pub fn compile(outputs: &[Output]) -> Result<MirProgram> {
    let mut ctx = CompilationContext::new();
    compile_with_context(&mut ctx, outputs)
}

/// Compiles into `ctx`, which is reset first. On error no document is produced.
pub fn compile_with_context(ctx: &mut CompilationContext, outputs: &[Output]) -> Result<MirProgram> {
    ctx.reset();

    let mut mir_outputs = Vec::with_capacity(outputs.len());
    for output in outputs {
        debug!(output = %output.name, party = %output.party.name, "lowering output");
        let inner = lower_operation(ctx, &output.inner)?;
        ctx.register_party(&output.party);
        mir_outputs.push(MirOutput {
            inner,
            name: output.name.clone(),
            party: output.party.name.clone(),
            ty: reify(&output.inner),
            source_ref: ctx.record_source(&output.source_ref),
        });
    }

    let mut functions = Vec::new();
    while let Some(function) = ctx.next_pending_function() {
        functions.push(lower_function(ctx, &function)?);
    }

    let parties = ctx.party_list();
    let inputs = ctx.input_list();

    info!(
        outputs = mir_outputs.len(),
        inputs = inputs.len(),
        parties = parties.len(),
        functions = functions.len(),
        "compiled program"
    );

    Ok(MirProgram {
        functions,
        parties,
        inputs,
        outputs: mir_outputs,
        source_files: ctx.source_files(),
    })
}

pub fn compile_to_string(outputs: &[Output], pretty: bool) -> Result<String> {
    let program = compile(outputs)?;
    let json = if pretty {
        program.to_json_pretty()?
    } else {
        program.to_json()?
    };
    Ok(json)
}
