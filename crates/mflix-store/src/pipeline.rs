//! Aggregation pipeline builders.
//!
//! Stages are described locally and rendered to the documents the database
//! expects. Nothing here executes a stage; see [`crate::MongoStore::aggregate`].
//!
//! ```
//! use mflix_store::pipeline::{filters, Facet, Pipeline, Stage};
//!
//! let pipeline = Pipeline::new()
//!     .push(Stage::match_(filters::eq("countries", "Portugal")))
//!     .push(Stage::facet([
//!         Facet::new("genres_count", [Stage::unwind("$genres"), Stage::sort_by_count("$genres")]),
//!         Facet::new("year_bucket", [Stage::bucket_auto("$year", 10)]),
//!     ]));
//!
//! assert_eq!(pipeline.len(), 2);
//! ```

use bson::{doc, Bson, Document};

/// Filter expression builders for `$match` stages and queries.
pub mod filters {
    use bson::{doc, Bson, Document};

    /// `{ <field>: <value> }`
    #[must_use]
    pub fn eq(field: &str, value: impl Into<Bson>) -> Document {
        doc! { field: value.into() }
    }

    /// `{ <field>: { $in: [<values>] } }`
    #[must_use]
    pub fn in_<I, V>(field: &str, values: I) -> Document
    where
        I: IntoIterator<Item = V>,
        V: Into<Bson>,
    {
        let values: Vec<Bson> = values.into_iter().map(Into::into).collect();
        doc! { field: { "$in": values } }
    }

    /// `{ $and: [<filters>] }`
    #[must_use]
    pub fn and(filters: impl IntoIterator<Item = Document>) -> Document {
        let filters: Vec<Document> = filters.into_iter().collect();
        doc! { "$and": filters }
    }
}

/// Accumulator builders for `$group` stages.
pub mod accumulators {
    use bson::{doc, Bson, Document};

    /// A named output field computed by an accumulator operator.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Accumulator {
        field: String,
        expression: Document,
    }

    impl Accumulator {
        fn new(field: &str, operator: &str, expression: impl Into<Bson>) -> Self {
            Self {
                field: field.to_string(),
                expression: doc! { operator: expression.into() },
            }
        }

        /// Output field name.
        #[must_use]
        pub fn field(&self) -> &str {
            &self.field
        }

        /// Operator document, e.g. `{ $addToSet: "$cast" }`.
        #[must_use]
        pub fn expression(&self) -> &Document {
            &self.expression
        }
    }

    /// `{ <field>: { $addToSet: <expression> } }`
    #[must_use]
    pub fn add_to_set(field: &str, expression: impl Into<Bson>) -> Accumulator {
        Accumulator::new(field, "$addToSet", expression)
    }

    /// `{ <field>: { $sum: <expression> } }`
    #[must_use]
    pub fn sum(field: &str, expression: impl Into<Bson>) -> Accumulator {
        Accumulator::new(field, "$sum", expression)
    }

    /// `{ <field>: { $push: <expression> } }`
    #[must_use]
    pub fn push(field: &str, expression: impl Into<Bson>) -> Accumulator {
        Accumulator::new(field, "$push", expression)
    }
}

use accumulators::Accumulator;

/// A single aggregation stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// `$match`: keep documents matching a filter.
    Match(Document),

    /// `$unwind`: one output document per element of an array field.
    Unwind(String),

    /// `$group`: group by `id`, computing each accumulator per group.
    Group {
        /// Group key expression.
        id: Bson,
        /// Computed output fields.
        accumulators: Vec<Accumulator>,
    },

    /// `$sortByCount`: group by an expression and sort by group size.
    SortByCount(Bson),

    /// `$bucket`: group into explicit ranges.
    Bucket {
        /// Expression to bucket on.
        group_by: Bson,
        /// Sorted lower bounds; each bucket spans up to the next bound.
        boundaries: Vec<Bson>,
        /// Bucket for values outside the boundaries.
        default: Option<Bson>,
    },

    /// `$bucketAuto`: group into N evenly filled ranges.
    BucketAuto {
        /// Expression to bucket on.
        group_by: Bson,
        /// Number of buckets.
        buckets: i32,
    },

    /// `$facet`: named sub-pipelines run over the same input.
    Facet(Vec<Facet>),

    /// `$sort`
    Sort(Document),

    /// `$limit`
    Limit(i64),

    /// `$addFields`
    AddFields(Document),

    /// `$lookup` with a sub-pipeline.
    Lookup {
        /// Collection to join.
        from: String,
        /// Variables from the input document visible to the sub-pipeline.
        let_vars: Document,
        /// Stages run against `from`.
        pipeline: Vec<Stage>,
        /// Output array field.
        as_field: String,
    },
}

impl Stage {
    /// `{ $match: <filter> }`
    #[must_use]
    pub fn match_(filter: Document) -> Self {
        Self::Match(filter)
    }

    /// `{ $unwind: <path> }`; `path` is a field path such as `"$cast"`.
    #[must_use]
    pub fn unwind(path: impl Into<String>) -> Self {
        Self::Unwind(path.into())
    }

    /// `{ $group: { _id: <id>, <accumulators>... } }`
    #[must_use]
    pub fn group(id: impl Into<Bson>, accumulators: impl IntoIterator<Item = Accumulator>) -> Self {
        Self::Group {
            id: id.into(),
            accumulators: accumulators.into_iter().collect(),
        }
    }

    /// `{ $sortByCount: <expression> }`
    #[must_use]
    pub fn sort_by_count(expression: impl Into<Bson>) -> Self {
        Self::SortByCount(expression.into())
    }

    /// `{ $bucket: { groupBy, boundaries, default } }`
    #[must_use]
    pub fn bucket<I, B>(group_by: impl Into<Bson>, boundaries: I, default: Option<Bson>) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bson>,
    {
        Self::Bucket {
            group_by: group_by.into(),
            boundaries: boundaries.into_iter().map(Into::into).collect(),
            default,
        }
    }

    /// `{ $bucketAuto: { groupBy, buckets } }`
    #[must_use]
    pub fn bucket_auto(group_by: impl Into<Bson>, buckets: i32) -> Self {
        Self::BucketAuto {
            group_by: group_by.into(),
            buckets,
        }
    }

    /// `{ $facet: { <name>: [<stages>], ... } }`
    #[must_use]
    pub fn facet(facets: impl IntoIterator<Item = Facet>) -> Self {
        Self::Facet(facets.into_iter().collect())
    }

    /// `{ $sort: <spec> }`
    #[must_use]
    pub fn sort(spec: Document) -> Self {
        Self::Sort(spec)
    }

    /// `{ $limit: <n> }`
    #[must_use]
    pub fn limit(n: i64) -> Self {
        Self::Limit(n)
    }

    /// `{ $addFields: <fields> }`
    #[must_use]
    pub fn add_fields(fields: Document) -> Self {
        Self::AddFields(fields)
    }

    /// `{ $lookup: { from, let, pipeline, as } }`
    #[must_use]
    pub fn lookup(
        from: impl Into<String>,
        let_vars: Document,
        pipeline: impl IntoIterator<Item = Stage>,
        as_field: impl Into<String>,
    ) -> Self {
        Self::Lookup {
            from: from.into(),
            let_vars,
            pipeline: pipeline.into_iter().collect(),
            as_field: as_field.into(),
        }
    }

    /// Render the stage document.
    #[must_use]
    pub fn to_document(&self) -> Document {
        match self {
            Self::Match(filter) => doc! { "$match": filter.clone() },
            Self::Unwind(path) => doc! { "$unwind": path.as_str() },
            Self::Group { id, accumulators } => {
                let mut group = doc! { "_id": id.clone() };
                for acc in accumulators {
                    group.insert(acc.field(), acc.expression().clone());
                }
                doc! { "$group": group }
            }
            Self::SortByCount(expression) => doc! { "$sortByCount": expression.clone() },
            Self::Bucket {
                group_by,
                boundaries,
                default,
            } => {
                let mut bucket = doc! {
                    "groupBy": group_by.clone(),
                    "boundaries": boundaries.clone(),
                };
                if let Some(default) = default {
                    bucket.insert("default", default.clone());
                }
                doc! { "$bucket": bucket }
            }
            Self::BucketAuto { group_by, buckets } => {
                doc! { "$bucketAuto": { "groupBy": group_by.clone(), "buckets": *buckets } }
            }
            Self::Facet(facets) => {
                let mut spec = Document::new();
                for facet in facets {
                    spec.insert(facet.name(), render(facet.stages()));
                }
                doc! { "$facet": spec }
            }
            Self::Sort(spec) => doc! { "$sort": spec.clone() },
            Self::Limit(n) => doc! { "$limit": *n },
            Self::AddFields(fields) => doc! { "$addFields": fields.clone() },
            Self::Lookup {
                from,
                let_vars,
                pipeline,
                as_field,
            } => doc! {
                "$lookup": {
                    "from": from.as_str(),
                    "let": let_vars.clone(),
                    "pipeline": render(pipeline),
                    "as": as_field.as_str(),
                }
            },
        }
    }
}

/// A named sub-pipeline of a `$facet` stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Facet {
    name: String,
    stages: Vec<Stage>,
}

impl Facet {
    /// Create a facet producing the `name` output field.
    #[must_use]
    pub fn new(name: impl Into<String>, stages: impl IntoIterator<Item = Stage>) -> Self {
        Self {
            name: name.into(),
            stages: stages.into_iter().collect(),
        }
    }

    /// Output field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sub-pipeline stages.
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }
}

/// An ordered sequence of stages submitted as a whole.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Create an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage.
    #[must_use]
    pub fn push(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Number of top-level stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the pipeline has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// The stages in submission order.
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Render every stage, in order.
    #[must_use]
    pub fn to_documents(&self) -> Vec<Document> {
        self.stages.iter().map(Stage::to_document).collect()
    }
}

impl FromIterator<Stage> for Pipeline {
    fn from_iter<I: IntoIterator<Item = Stage>>(iter: I) -> Self {
        Self {
            stages: iter.into_iter().collect(),
        }
    }
}

fn render(stages: &[Stage]) -> Vec<Document> {
    stages.iter().map(Stage::to_document).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_stage() {
        let stage = Stage::match_(filters::eq("countries", "Portugal"));
        assert_eq!(
            stage.to_document(),
            doc! { "$match": { "countries": "Portugal" } }
        );
    }

    #[test]
    fn group_with_accumulators_keeps_order() {
        let stage = Stage::group(
            "$genres",
            [
                accumulators::sum("count", 1),
                accumulators::push("titles", "$title"),
            ],
        );
        let rendered = stage.to_document();
        assert_eq!(
            rendered,
            doc! {
                "$group": {
                    "_id": "$genres",
                    "count": { "$sum": 1 },
                    "titles": { "$push": "$title" },
                }
            }
        );

        let keys: Vec<&String> = rendered.get_document("$group").unwrap().keys().collect();
        assert_eq!(keys, ["_id", "count", "titles"]);
    }

    #[test]
    fn bucket_with_default() {
        let stage = Stage::bucket("$year", [1900, 1950, 2000], Some(Bson::from("other")));
        assert_eq!(
            stage.to_document(),
            doc! {
                "$bucket": {
                    "groupBy": "$year",
                    "boundaries": [1900, 1950, 2000],
                    "default": "other",
                }
            }
        );
    }

    #[test]
    fn bucket_without_default_omits_field() {
        let stage = Stage::bucket("$year", [1900, 2000], None);
        let bucket = stage.to_document();
        assert!(!bucket.get_document("$bucket").unwrap().contains_key("default"));
    }

    #[test]
    fn lookup_renders_sub_pipeline() {
        let stage = Stage::lookup(
            "comments",
            doc! { "id": "$_id" },
            [
                Stage::match_(doc! { "$expr": { "$eq": ["$movie_id", "$$id"] } }),
                Stage::limit(5),
            ],
            "comments",
        );
        assert_eq!(
            stage.to_document(),
            doc! {
                "$lookup": {
                    "from": "comments",
                    "let": { "id": "$_id" },
                    "pipeline": [
                        { "$match": { "$expr": { "$eq": ["$movie_id", "$$id"] } } },
                        { "$limit": 5_i64 },
                    ],
                    "as": "comments",
                }
            }
        );
    }

    #[test]
    fn filters_combine() {
        let filter = filters::and([
            filters::eq("countries", "Portugal"),
            filters::in_("genres", ["Drama", "Comedy"]),
        ]);
        assert_eq!(
            filter,
            doc! {
                "$and": [
                    { "countries": "Portugal" },
                    { "genres": { "$in": ["Drama", "Comedy"] } },
                ]
            }
        );
    }

    #[test]
    fn pipeline_from_iterator() {
        let pipeline: Pipeline = [Stage::sort(doc! { "year": -1 }), Stage::limit(3)]
            .into_iter()
            .collect();
        assert_eq!(pipeline.len(), 2);
        assert!(!pipeline.is_empty());
        assert_eq!(
            pipeline.to_documents(),
            vec![doc! { "$sort": { "year": -1 } }, doc! { "$limit": 3_i64 }]
        );
    }

    #[test]
    fn add_fields_stage() {
        let stage = Stage::add_fields(doc! { "cast_size": { "$size": "$cast" } });
        assert_eq!(
            stage.to_document(),
            doc! { "$addFields": { "cast_size": { "$size": "$cast" } } }
        );
    }
}
