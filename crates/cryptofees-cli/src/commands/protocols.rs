use cryptofees_core::{AdapterRegistry, ProtocolId, ProtocolMetadata};
use serde::Serialize;

use crate::error::CliError;
use crate::output::Table;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct ProtocolRow<'a> {
    id: &'a ProtocolId,
    #[serde(flatten)]
    metadata: &'a ProtocolMetadata,
}

#[derive(Debug, Serialize)]
struct ProtocolsResponseData<'a> {
    protocols: Vec<ProtocolRow<'a>>,
}

pub fn run(registry: &AdapterRegistry) -> Result<CommandResult, CliError> {
    let protocols = registry
        .registrations()
        .map(|registration| ProtocolRow {
            id: &registration.id,
            metadata: &registration.metadata,
        })
        .collect::<Vec<_>>();

    let mut table = Table::new(vec!["id", "name", "category", "blockchain"]);
    for row in &protocols {
        table.push_row(vec![
            row.id.to_string(),
            row.metadata.name.clone(),
            row.metadata.category.to_string(),
            row.metadata.blockchain.clone().unwrap_or_default(),
        ]);
    }

    let data = serde_json::to_value(ProtocolsResponseData { protocols })?;
    Ok(CommandResult::ok(data, table))
}
