//! Projection specs: which output fields to produce and how.

/// How a single output field is derived from a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionRule {
    /// Copy the value at a (possibly dotted) path verbatim.
    /// A missing source field is left out of the output.
    Field(String),

    /// Build a sub-object from the first element of a sequence.
    ///
    /// Each `(output, path)` pair reads `path` relative to the head element.
    /// The sub-object is `null` when the sequence is missing or empty.
    FirstOf {
        sequence: String,
        fields: Vec<(String, String)>,
    },

    /// Build a sub-object from named sub-fields of an optional sub-document.
    ///
    /// The sub-object is `null` when the sub-document is missing or `null`.
    SubFields {
        document: String,
        fields: Vec<(String, String)>,
    },
}

impl ExtractionRule {
    pub fn field(path: impl Into<String>) -> Self {
        Self::Field(path.into())
    }

    pub fn first_of(sequence: impl Into<String>, fields: &[(&str, &str)]) -> Self {
        Self::FirstOf {
            sequence: sequence.into(),
            fields: owned_pairs(fields),
        }
    }

    pub fn sub_fields(document: impl Into<String>, fields: &[(&str, &str)]) -> Self {
        Self::SubFields {
            document: document.into(),
            fields: owned_pairs(fields),
        }
    }
}

fn owned_pairs(fields: &[(&str, &str)]) -> Vec<(String, String)> {
    fields
        .iter()
        .map(|(output, path)| (output.to_string(), path.to_string()))
        .collect()
}

/// Scalar order fields passed through unchanged.
pub const ORDER_PASSTHROUGH_FIELDS: &[&str] = &[
    "_id",
    "provider_id",
    "shop_id",
    "channel_id",
    "member_id",
    "created_date",
    "modified_date",
    "date_created",
    "order_id",
    "full_order_code",
    "order_from",
    "order_status_id",
    "firstname",
    "lastname",
    "email",
    "phone",
    "shipping_firstname",
    "shipping_lastname",
    "shipping_email",
    "shipping_phone",
    "shipping_address_1",
    "shipping_address_2",
    "shipping_subdistrict",
    "shipping_district",
    "shipping_province",
    "shipping_zipcode",
    "grand_total",
    "extern_member_id",
];

/// Ordered mapping of output field name to extraction rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectionSpec {
    rules: Vec<(String, ExtractionRule)>,
}

impl ProjectionSpec {
    /// Creates an empty spec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an output field, replacing an earlier rule with the same name.
    pub fn with(mut self, output: impl Into<String>, rule: ExtractionRule) -> Self {
        let output = output.into();
        match self.rules.iter_mut().find(|(name, _)| *name == output) {
            Some(existing) => existing.1 = rule,
            None => self.rules.push((output, rule)),
        }
        self
    }

    /// Adds passthrough rules for fields whose output name equals their path.
    pub fn passthrough(self, fields: &[&str]) -> Self {
        fields
            .iter()
            .fold(self, |spec, field| spec.with(*field, ExtractionRule::field(*field)))
    }

    /// Iterates over `(output, rule)` pairs in output order.
    pub fn rules(&self) -> impl Iterator<Item = (&str, &ExtractionRule)> {
        self.rules.iter().map(|(name, rule)| (name.as_str(), rule))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The fixed projection for `btw_orders` records.
    ///
    /// Marketplace sub-documents are flattened into `lazada_info`,
    /// `shopee_info` and `line_shopping_info`.
    pub fn order_view() -> Self {
        Self::new()
            .passthrough(ORDER_PASSTHROUGH_FIELDS)
            .with(
                "lazada_info",
                ExtractionRule::first_of(
                    "order_lazada",
                    &[
                        ("customer_first_name", "customer_first_name"),
                        ("customer_last_name", "customer_last_name"),
                    ],
                ),
            )
            .with(
                "shopee_info",
                ExtractionRule::first_of(
                    "order_shopee",
                    &[
                        ("shopee_user_id", "raw_body.buyer_user_id"),
                        ("shopee_user_name", "raw_body.buyer_username"),
                    ],
                ),
            )
            .with(
                "line_shopping_info",
                ExtractionRule::sub_fields(
                    "order_line_shopping",
                    &[
                        ("recipientName", "shipping_address.recipientName"),
                        ("address", "shipping_address.address"),
                        ("province", "shipping_address.province"),
                        ("postalCode", "shipping_address.postalCode"),
                        ("phoneNumber", "shipping_address.phoneNumber"),
                        ("email", "shipping_address.email"),
                        ("district", "shipping_address.district"),
                        ("subDistrict", "shipping_address.subDistrict"),
                    ],
                ),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_replaces_existing_rule_in_place() {
        let spec = ProjectionSpec::new()
            .with("a", ExtractionRule::field("x"))
            .with("b", ExtractionRule::field("y"))
            .with("a", ExtractionRule::field("z"));

        let rules: Vec<_> = spec.rules().collect();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0], ("a", &ExtractionRule::field("z")));
        assert_eq!(rules[1].0, "b");
    }

    #[test]
    fn order_view_has_marketplace_sub_objects_last() {
        let spec = ProjectionSpec::order_view();
        assert_eq!(spec.len(), ORDER_PASSTHROUGH_FIELDS.len() + 3);

        let names: Vec<_> = spec.rules().map(|(name, _)| name).collect();
        assert_eq!(
            &names[names.len() - 3..],
            &["lazada_info", "shopee_info", "line_shopping_info"]
        );
    }

    #[test]
    fn shopee_rule_reads_raw_body() {
        let spec = ProjectionSpec::order_view();
        let (_, rule) = spec
            .rules()
            .find(|(name, _)| *name == "shopee_info")
            .unwrap();

        match rule {
            ExtractionRule::FirstOf { sequence, fields } => {
                assert_eq!(sequence, "order_shopee");
                assert!(fields.contains(&(
                    "shopee_user_id".to_string(),
                    "raw_body.buyer_user_id".to_string()
                )));
            }
            other => panic!("unexpected rule {other:?}"),
        }
    }
}
