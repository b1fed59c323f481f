//! Synthetic variant records for testing.

use vds_region::Value;
use vds_table::metadata::TableMetadata;

pub const SAMPLE_GLOBAL_SCHEMA: &str = "Empty";
pub const SAMPLE_SAMPLE_SCHEMA: &str = "String";
pub const SAMPLE_SAMPLE_ANNOTATION_SCHEMA: &str = "Struct{pop: String}";
pub const SAMPLE_VARIANT_SCHEMA: &str = "Variant(GRCh37)";
pub const SAMPLE_VARIANT_ANNOTATION_SCHEMA: &str =
    "Struct{rsid: String, qual: Float64, filters: Set[String], pass: Boolean}";
pub const SAMPLE_GENOTYPE_SCHEMA: &str =
    "Struct{GT: Call, AD: Array[!Int32], DP: Int32, GQ: Float32}";

/// Metadata of a table with the sample schema.
pub fn sample_metadata(n_partitions: usize) -> TableMetadata {
    TableMetadata {
        n_partitions,
        global_schema: SAMPLE_GLOBAL_SCHEMA.to_string(),
        sample_schema: SAMPLE_SAMPLE_SCHEMA.to_string(),
        sample_annotation_schema: SAMPLE_SAMPLE_ANNOTATION_SCHEMA.to_string(),
        variant_schema: SAMPLE_VARIANT_SCHEMA.to_string(),
        variant_annotation_schema: SAMPLE_VARIANT_ANNOTATION_SCHEMA.to_string(),
        genotype_schema: SAMPLE_GENOTYPE_SCHEMA.to_string(),
    }
}

/// One sample's genotype entry. `None` fields are missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Genotype {
    pub gt: Option<i32>,
    pub ad: Option<Vec<i32>>,
    pub dp: Option<i32>,
    pub gq: Option<f32>,
}

impl Genotype {
    pub fn to_value(&self) -> Value {
        Value::Struct(vec![
            self.gt.into(),
            self.ad
                .as_ref()
                .map_or(Value::Missing, |ad| {
                    Value::Array(ad.iter().copied().map(Value::Int32).collect())
                }),
            self.dp.into(),
            self.gq.into(),
        ])
    }
}

/// One row of a table with the sample schema: a biallelic or multiallelic
/// variant with its annotations and per-sample genotypes.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantRecord {
    pub contig: String,
    pub pos: i32,
    pub ref_allele: String,
    pub alt_alleles: Vec<String>,
    pub rsid: Option<String>,
    pub qual: Option<f64>,
    pub filters: Vec<String>,
    pub pass: Option<bool>,
    /// `None` entries are missing genotypes. The whole array is missing when
    /// `genotypes` is `None`.
    pub genotypes: Option<Vec<Option<Genotype>>>,
}

impl VariantRecord {
    pub fn new(contig: &str, pos: i32, ref_allele: &str, alt: &str) -> VariantRecord {
        VariantRecord {
            contig: contig.to_string(),
            pos,
            ref_allele: ref_allele.to_string(),
            alt_alleles: vec![alt.to_string()],
            rsid: None,
            qual: None,
            filters: Vec::new(),
            pass: None,
            genotypes: Some(Vec::new()),
        }
    }

    /// The row value, shaped like the fundamental row type of the sample
    /// schema: `Struct{pk, v, va, gs}`.
    pub fn to_row(&self) -> Value {
        let pk = Value::Struct(vec![self.contig.as_str().into(), self.pos.into()]);
        let alt_alleles = self
            .alt_alleles
            .iter()
            .map(|alt| Value::Struct(vec![self.ref_allele.as_str().into(), alt.as_str().into()]))
            .collect();
        let v = Value::Struct(vec![
            self.contig.as_str().into(),
            self.pos.into(),
            self.ref_allele.as_str().into(),
            Value::Array(alt_alleles),
        ]);
        let va = Value::Struct(vec![
            self.rsid.clone().into(),
            self.qual.into(),
            Value::Array(self.filters.iter().map(|f| f.as_str().into()).collect()),
            self.pass.into(),
        ]);
        let gs = self.genotypes.as_ref().map_or(Value::Missing, |gs| {
            Value::Array(
                gs.iter()
                    .map(|g| g.as_ref().map_or(Value::Missing, Genotype::to_value))
                    .collect(),
            )
        });
        Value::Struct(vec![pk, v, va, gs])
    }
}

/// Generates `count` random records with `n_samples` genotypes each, sorted by
/// position on one contig.
pub fn random_records(
    rng: &mut fastrand::Rng,
    count: usize,
    n_samples: usize,
) -> Vec<VariantRecord> {
    const BASES: [&str; 4] = ["A", "C", "G", "T"];
    let mut pos = 1;
    (0..count)
        .map(|_| {
            pos += rng.i32(1..1000);
            let n_alts = rng.usize(1..4);
            let genotypes = (0..n_samples)
                .map(|_| {
                    rng.bool().then(|| Genotype {
                        gt: rng.bool().then(|| rng.i32(0..6)),
                        ad: rng
                            .bool()
                            .then(|| (0..=n_alts).map(|_| rng.i32(0..60)).collect()),
                        dp: rng.bool().then(|| rng.i32(0..200)),
                        gq: rng.bool().then(|| rng.f32() * 99.0),
                    })
                })
                .collect();
            VariantRecord {
                contig: "20".to_string(),
                pos,
                ref_allele: BASES[rng.usize(..4)].to_string(),
                alt_alleles: (0..n_alts)
                    .map(|_| BASES[rng.usize(..4)].repeat(rng.usize(1..4)))
                    .collect(),
                rsid: rng.bool().then(|| format!("rs{}", rng.u32(1..10_000_000))),
                qual: rng.bool().then(|| rng.f64() * 1000.0),
                filters: (0..rng.usize(0..3)).map(|i| format!("F{i}")).collect(),
                pass: rng.bool().then(|| rng.bool()),
                genotypes: (rng.usize(0..10) != 0).then_some(genotypes),
            }
        })
        .collect()
}
