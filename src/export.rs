//! Extract producer
//!
//! Pulls custom ticket fields and their dropdown/tagger options from each
//! tenant and writes them as the flat extracts `replicate` reads. Remote
//! failures skip the tenant (or the field) and are counted; local write
//! failures are fatal.

use crate::client::{FieldCatalog, TicketField};
use crate::config::ExtractSettings;
use crate::error::{ConfigResult, RemoteErrorKind};
use crate::extract::{ExtractWriter, FieldExtractRow, OptionExtractRow};
use crate::registry::TenantInstance;
use serde::Serialize;
use std::io::Write;

/// Result of an export run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub tenants: usize,
    pub fields: usize,
    pub options: usize,
    /// Tenants whose field listing failed
    pub failed_tenants: Vec<FailedTenant>,
    /// Fields whose options could not be fetched
    pub failed_fields: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedTenant {
    pub tenant: String,
    pub kind: RemoteErrorKind,
}

impl ExportSummary {
    pub fn has_failures(&self) -> bool {
        !self.failed_tenants.is_empty() || self.failed_fields > 0
    }
}

/// Writes field and option extracts from live tenants
pub struct Exporter<'a, C: ?Sized> {
    catalog: &'a C,
    settings: &'a ExtractSettings,
}

impl<'a, C: FieldCatalog + ?Sized> Exporter<'a, C> {
    pub fn new(catalog: &'a C, settings: &'a ExtractSettings) -> Self {
        Self { catalog, settings }
    }

    pub async fn run<F: Write, O: Write>(
        &self,
        tenants: &[TenantInstance],
        fields: &mut ExtractWriter<F>,
        options: &mut ExtractWriter<O>,
    ) -> ConfigResult<ExportSummary> {
        let mut summary = ExportSummary::default();

        for tenant in tenants {
            summary.tenants += 1;

            let ticket_fields = match self.catalog.ticket_fields(tenant).await {
                Ok(ticket_fields) => ticket_fields,
                Err(e) => {
                    tracing::warn!(
                        tenant = tenant.domain(),
                        kind = %e.kind(),
                        "Failed to fetch ticket fields: {}",
                        e
                    );
                    summary.failed_tenants.push(FailedTenant {
                        tenant: tenant.domain().to_string(),
                        kind: e.kind(),
                    });
                    continue;
                }
            };

            let custom: Vec<&TicketField> = ticket_fields
                .iter()
                .filter(|f| self.settings.keeps(f.id, &f.field_type))
                .collect();
            tracing::info!(
                tenant = tenant.domain(),
                total = ticket_fields.len(),
                custom = custom.len(),
                "Fetched ticket fields"
            );

            for field in custom {
                fields.write(&FieldExtractRow {
                    subdomain: tenant.domain().to_string(),
                    field_id: field.id,
                    field_title: field.title.clone(),
                    field_type: field.field_type.clone(),
                })?;
                summary.fields += 1;

                if !self.settings.has_options(&field.field_type) {
                    continue;
                }
                match self.export_options(tenant, field, options).await? {
                    Some(count) => summary.options += count,
                    None => summary.failed_fields += 1,
                }
            }
        }

        Ok(summary)
    }

    /// Rows written, or `None` when the options could not be fetched
    async fn export_options<O: Write>(
        &self,
        tenant: &TenantInstance,
        field: &TicketField,
        options: &mut ExtractWriter<O>,
    ) -> ConfigResult<Option<usize>> {
        let field_options = match self.catalog.field_options(tenant, field.id).await {
            Ok(field_options) => field_options,
            Err(e) => {
                tracing::warn!(
                    tenant = tenant.domain(),
                    field_id = field.id,
                    kind = %e.kind(),
                    "Failed to fetch field options: {}",
                    e
                );
                return Ok(None);
            }
        };

        for option in &field_options {
            options.write(&OptionExtractRow {
                subdomain: tenant.domain().to_string(),
                field_name: field.title.clone(),
                field_id: field.id,
                option_id: option.id,
                option_value: option.name.clone(),
            })?;
        }
        Ok(Some(field_options.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{FieldOption, RemoteResult};
    use crate::error::RemoteError;
    use crate::extract::{FieldReader, OptionReader, FIELD_EXTRACT_HEADER, OPTION_EXTRACT_HEADER};
    use crate::naming::{self, ContentItem};
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct StaticCatalog {
        fields: HashMap<String, Vec<TicketField>>,
        options: HashMap<u64, Vec<FieldOption>>,
    }

    #[async_trait]
    impl FieldCatalog for StaticCatalog {
        async fn ticket_fields(&self, tenant: &TenantInstance) -> RemoteResult<Vec<TicketField>> {
            self.fields
                .get(tenant.domain())
                .cloned()
                .ok_or(RemoteError::Unauthorized)
        }

        async fn field_options(
            &self,
            _tenant: &TenantInstance,
            field_id: u64,
        ) -> RemoteResult<Vec<FieldOption>> {
            self.options
                .get(&field_id)
                .cloned()
                .ok_or(RemoteError::ServerError {
                    status: 500,
                    detail: "options unavailable".into(),
                })
        }
    }

    fn field(id: u64, field_type: &str, title: &str) -> TicketField {
        TicketField {
            id,
            field_type: field_type.into(),
            title: title.into(),
        }
    }

    fn option(id: u64, name: &str) -> FieldOption {
        FieldOption {
            id,
            name: name.into(),
        }
    }

    fn catalog() -> StaticCatalog {
        let fields = vec![
            field(1, "subject", "Subject"),
            field(360001, "priority", "Priority"),
            field(360002, "dropdown", "Region"),
            field(360003, "text", "Order Number"),
            field(360004, "tagger", "Product"),
        ];
        StaticCatalog {
            fields: HashMap::from([("acme".to_string(), fields)]),
            options: HashMap::from([(
                360002,
                vec![option(11, "EMEA"), option(12, "APAC")],
            )]),
        }
    }

    #[tokio::test]
    async fn test_export_filters_and_writes() {
        let settings = ExtractSettings::default();
        let catalog = catalog();
        let mut fields = ExtractWriter::new(Vec::new(), &FIELD_EXTRACT_HEADER).unwrap();
        let mut options = ExtractWriter::new(Vec::new(), &OPTION_EXTRACT_HEADER).unwrap();
        let tenants = [
            TenantInstance::new("acme", "a@acme.com", "s"),
            TenantInstance::new("locked", "a@locked.com", "s"),
        ];

        let summary = Exporter::new(&catalog, &settings)
            .run(&tenants, &mut fields, &mut options)
            .await
            .unwrap();

        assert_eq!(summary.tenants, 2);
        assert_eq!(summary.fields, 3);
        assert_eq!(summary.options, 2);
        // Product options are missing from the catalog
        assert_eq!(summary.failed_fields, 1);
        assert_eq!(
            summary.failed_tenants,
            vec![FailedTenant {
                tenant: "locked".into(),
                kind: RemoteErrorKind::Unauthorized
            }]
        );
        assert!(summary.has_failures());

        let fields = fields.finish().unwrap();
        let options = options.finish().unwrap();
        let field_text = String::from_utf8(fields.clone()).unwrap();
        assert!(field_text.starts_with("subdomain,field_id,field_title,field_type\n"));
        assert!(field_text.contains("acme,360003,Order Number,text"));

        let items = naming::resolve(
            FieldReader::new("fields", fields.as_slice()).unwrap(),
            OptionReader::new("options", options.as_slice()).unwrap(),
        );
        let keys: Vec<_> = items.iter().map(|i: &ContentItem| i.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "TF::Title-Region",
                "TF::Title-Order Number",
                "TF::Title-Product",
                "TF::Title-Region::EMEA",
                "TF::Title-Region::APAC",
            ]
        );
    }
}
