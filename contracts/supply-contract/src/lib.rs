use ciborium::{de::from_reader, ser::into_writer};
use freenet_scaffold::ComposableState;
use freenet_stdlib::prelude::*;
use supply_core::{ContractParameters, ContractState, ContractSummary, Invocation};

#[allow(dead_code)]
struct SupplyContract;

fn decode_state(state: &[u8]) -> Result<ContractState, ContractError> {
    if state.is_empty() {
        return Ok(ContractState::new());
    }
    ContractState::from_cbor(state).map_err(|e| ContractError::Deser(e.to_string()))
}

#[contract]
impl ContractInterface for SupplyContract {
    fn validate_state(
        _parameters: Parameters<'static>,
        state: State<'static>,
        _related: RelatedContracts<'static>,
    ) -> Result<ValidateResult, ContractError> {
        let bytes = state.as_ref();
        // allow empty state
        if bytes.is_empty() {
            return Ok(ValidateResult::Valid);
        }
        let contract_state = decode_state(bytes)?;
        contract_state
            .verify(&contract_state, &ContractParameters)
            .map(|_| ValidateResult::Valid)
            .map_err(|e| {
                freenet_stdlib::log::info(&format!("Rejecting supply contract state: {}", e));
                ContractError::InvalidState
            })
    }

    fn update_state(
        _parameters: Parameters<'static>,
        state: State<'static>,
        data: Vec<UpdateData<'static>>,
    ) -> Result<UpdateModification<'static>, ContractError> {
        let mut contract_state = decode_state(state.as_ref())?;

        for update in data {
            match update {
                UpdateData::State(new_state) => {
                    let new_state = decode_state(new_state.as_ref())?;
                    contract_state
                        .merge(&contract_state.clone(), &ContractParameters, &new_state)
                        .map_err(ContractError::Other)?;
                }
                UpdateData::Delta(d) => {
                    if d.as_ref().is_empty() {
                        continue;
                    }
                    let invocations = from_reader::<Vec<Invocation>, &[u8]>(d.as_ref())
                        .map_err(|e| ContractError::Deser(e.to_string()))?;
                    contract_state
                        .apply_delta(
                            &contract_state.clone(),
                            &ContractParameters,
                            &Some(invocations),
                        )
                        .map_err(ContractError::Other)?;
                }
                UpdateData::RelatedState { .. } => {
                    // the contract has no related contracts
                }
                _ => return Err(ContractError::InvalidUpdate),
            }
        }

        let updated_state = contract_state
            .to_cbor()
            .map_err(|e| ContractError::Deser(e.to_string()))?;
        Ok(UpdateModification::valid(updated_state.into()))
    }

    fn summarize_state(
        _parameters: Parameters<'static>,
        state: State<'static>,
    ) -> Result<StateSummary<'static>, ContractError> {
        let state = state.as_ref();
        if state.is_empty() {
            return Ok(StateSummary::from(vec![]));
        }
        let contract_state = decode_state(state)?;
        let summary = contract_state.summarize(&contract_state, &ContractParameters);
        let mut summary_bytes = vec![];
        into_writer(&summary, &mut summary_bytes)
            .map_err(|e| ContractError::Deser(e.to_string()))?;
        Ok(StateSummary::from(summary_bytes))
    }

    fn get_state_delta(
        _parameters: Parameters<'static>,
        state: State<'static>,
        summary: StateSummary<'static>,
    ) -> Result<StateDelta<'static>, ContractError> {
        let contract_state = decode_state(state.as_ref())?;
        let summary = if summary.as_ref().is_empty() {
            ContractSummary::default()
        } else {
            from_reader::<ContractSummary, &[u8]>(summary.as_ref())
                .map_err(|e| ContractError::Deser(e.to_string()))?
        };
        let Some(delta) = contract_state.delta(&contract_state, &ContractParameters, &summary)
        else {
            return Ok(StateDelta::from(vec![]));
        };
        let mut delta_bytes = vec![];
        into_writer(&delta, &mut delta_bytes).map_err(|e| ContractError::Deser(e.to_string()))?;
        Ok(StateDelta::from(delta_bytes))
    }
}
