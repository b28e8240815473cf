use std::sync::Arc;

use indexmap::IndexMap;
use nada_mir_core::{
    FunctionId, Input, MirInput, MirParty, NadaFunction, Party, SourceFiles, SourceRef,
    TypeDescriptor,
};
use tracing::{debug, warn};

use crate::errors::{CompileError, Result};

#[derive(Debug, Clone)]
struct RegisteredInput {
    input: Arc<Input>,
    ty: TypeDescriptor,
}

/// Symbol tables populated while lowering one program.
///
/// Every table is insertion ordered, so the emitted `functions`, `parties` and `inputs` follow
/// first-discovery order during traversal. Each compilation owns its context; nothing is shared
/// between runs.
#[derive(Debug, Default)]
pub struct CompilationContext {
    inputs: IndexMap<String, IndexMap<String, RegisteredInput>>,
    parties: IndexMap<String, Party>,
    functions: IndexMap<FunctionId, Arc<NadaFunction>>,
    next_function: usize,
    source_files: SourceFiles,
}

impl CompilationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.inputs.clear();
        self.parties.clear();
        self.functions.clear();
        self.next_function = 0;
        self.source_files.clear();
    }

    /// Registers a party by name. A later definition replaces an earlier one.
    pub fn register_party(&mut self, party: &Party) {
        if let Some(previous) = self.parties.get(&party.name) {
            if previous.source_ref != party.source_ref {
                warn!(party = %party.name, "party redefined at a different location");
            }
        }
        self.parties.insert(party.name.clone(), party.clone());
    }

    /// Registers an input and its owning party.
    ///
    /// Registering the same input instance again is a no-op; a different instance with the same
    /// party and name is rejected.
    pub fn register_input(&mut self, input: &Arc<Input>, ty: TypeDescriptor) -> Result<()> {
        self.register_party(&input.party);

        let party_inputs = self.inputs.entry(input.party.name.clone()).or_default();
        if let Some(existing) = party_inputs.get(&input.name) {
            if Arc::ptr_eq(&existing.input, input) {
                return Ok(());
            }
            return Err(CompileError::DuplicateInput {
                party: input.party.name.clone(),
                name: input.name.clone(),
            });
        }

        debug!(party = %input.party.name, input = %input.name, "registered input");
        party_inputs.insert(
            input.name.clone(),
            RegisteredInput {
                input: Arc::clone(input),
                ty,
            },
        );
        Ok(())
    }

    /// Queues a function for lowering unless its id was already seen in this run.
    pub fn register_function(&mut self, function: &Arc<NadaFunction>) -> bool {
        if self.functions.contains_key(&function.id) {
            return false;
        }
        debug!(id = %function.id, function = %function.name, "registered function");
        self.functions.insert(function.id, Arc::clone(function));
        true
    }

    /// Next registered function that has not been handed out yet.
    ///
    /// Functions registered while lowering a returned function are appended and will be returned
    /// by later calls, so draining with this until `None` covers nested references.
    pub fn next_pending_function(&mut self) -> Option<Arc<NadaFunction>> {
        let (_, function) = self.functions.get_index(self.next_function)?;
        self.next_function += 1;
        Some(Arc::clone(function))
    }

    pub fn pending_functions(&self) -> usize {
        self.functions.len() - self.next_function
    }

    pub fn record_source(&mut self, source_ref: &SourceRef) -> SourceRef {
        self.source_files.record(source_ref)
    }

    pub fn party_list(&mut self) -> Vec<MirParty> {
        let parties: Vec<Party> = self.parties.values().cloned().collect();
        parties
            .iter()
            .map(|party| MirParty {
                name: party.name.clone(),
                source_ref: self.record_source(&party.source_ref),
            })
            .collect()
    }

    /// Inputs grouped by party, then flattened.
    pub fn input_list(&mut self) -> Vec<MirInput> {
        let registered: Vec<RegisteredInput> = self
            .inputs
            .values()
            .flat_map(|party_inputs| party_inputs.values().cloned())
            .collect();
        registered
            .into_iter()
            .map(|RegisteredInput { input, ty }| MirInput {
                name: input.name.clone(),
                ty,
                party: input.party.name.clone(),
                doc: input.doc.clone(),
                source_ref: self.record_source(&input.source_ref),
            })
            .collect()
    }

    pub fn source_files(&self) -> Vec<String> {
        self.source_files.to_vec()
    }

    pub fn input_count(&self) -> usize {
        self.inputs.values().map(IndexMap::len).sum()
    }

    pub fn party_count(&self) -> usize {
        self.parties.len()
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }
}
