use prettytable::{
    format::{LinePosition, LineSeparator, TableFormat},
    row,
    Table,
};
use xs2a_engine::{crypto::CryptoProviderRegistry, db_types::Authorisation};

fn markdown_format() -> TableFormat {
    prettytable::format::FormatBuilder::new()
        .column_separator('|')
        .borders('|')
        .separator(LinePosition::Title, LineSeparator::new('-', '|', '|', '|'))
        .padding(1, 1)
        .build()
}

pub fn format_providers(registry: &CryptoProviderRegistry) -> String {
    let id_default = registry.default_id_provider();
    let data_default = registry.default_data_provider();
    let mut table = Table::new();
    table.set_format(markdown_format());
    table.set_titles(row!["Provider", "Identifiers", "Session data"]);
    for id in registry.provider_ids() {
        let mark = |default: &str| if default == id { "default" } else { "" };
        table.add_row(row![id, mark(id_default.id()), mark(data_default.id())]);
    }
    table.to_string()
}

pub fn format_authorisations(authorisations: &[Authorisation]) -> String {
    if authorisations.is_empty() {
        return "No authorisations".to_string();
    }
    let mut table = Table::new();
    table.set_format(markdown_format());
    table.set_titles(row!["Authorisation id", "Kind", "Approach", "Status", "Error", "Version", "Expires"]);
    for auth in authorisations {
        let error = auth.error_code.map(|c| c.to_string()).unwrap_or_default();
        table.add_row(row![
            auth.authorisation_id,
            auth.authorisation_kind,
            auth.sca_approach,
            auth.sca_status,
            error,
            auth.version,
            auth.expires_at.format("%Y-%m-%d %H:%M:%S")
        ]);
    }
    table.to_string()
}
