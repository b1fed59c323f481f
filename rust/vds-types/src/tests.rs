use crate::{
    registry::TypeRegistry,
    type_def::{Field, Kind, Layout, TypeId},
};

fn all_ids(registry: &TypeRegistry) -> impl Iterator<Item = TypeId> {
    (0..registry.len()).map(TypeId::new)
}

#[test]
fn test_interning_is_idempotent() {
    let mut registry = TypeRegistry::new();
    let a = registry.parse("Struct{x: !Int32, y: Array[Float64]}").unwrap();
    let len = registry.len();
    let b = registry.parse("Struct{x: !Int32, y: Array[Float64]}").unwrap();
    assert_eq!(a, b);
    assert_eq!(registry.len(), len);

    let fields = vec![
        Field::new("x", registry.int32(true)),
        Field::new("y", registry.array_type(registry.float64(false), false)),
    ];
    assert_eq!(registry.struct_type(fields, false), a);

    // Requiredness and field order are part of the identity.
    let required = registry.parse("!Struct{x: !Int32, y: Array[Float64]}").unwrap();
    assert_ne!(required, a);
    let reordered = registry.parse("Struct{y: Array[Float64], x: !Int32}").unwrap();
    assert_ne!(reordered, a);

    let l1 = registry.locus_type("GRCh37", false);
    let l2 = registry.locus_type("GRCh37", false);
    let l3 = registry.locus_type("GRCh38", false);
    assert_eq!(l1, l2);
    assert_ne!(l1, l3);
}

#[test]
fn test_scalar_singletons() {
    let registry = TypeRegistry::new();
    let cases = [
        (registry.boolean(false), Kind::Boolean, Layout::new(1, 1)),
        (registry.int32(true), Kind::Int32, Layout::new(4, 4)),
        (registry.int64(false), Kind::Int64, Layout::new(8, 8)),
        (registry.float32(true), Kind::Float32, Layout::new(4, 4)),
        (registry.float64(false), Kind::Float64, Layout::new(8, 8)),
        (registry.string(true), Kind::String, Layout::REFERENCE),
    ];
    for (id, kind, layout) in cases {
        let ty = registry.ty(id);
        assert_eq!(ty.kind(), kind);
        assert_eq!(ty.layout(), layout);
        assert!(ty.is_fundamental());
    }
    assert_ne!(registry.int32(true), registry.int32(false));
    assert_eq!(registry.ty(registry.call(true)).kind(), Kind::Call);
}

#[test]
fn test_struct_layout_is_deterministic_and_bounded() {
    let mut registry = TypeRegistry::new();
    let text = "Struct{a: Boolean, b: !Int64, c: String, d: Int32, e: Float32, \
                f: Struct{g: Boolean, h: !Float64}, i: Array[Int32], j: Boolean}";
    let id = registry.parse(text).unwrap();
    let ty = registry.ty(id);
    let st = ty.as_struct().unwrap();

    assert_eq!(st.n_nullable_fields(), 7);
    assert_eq!(st.missing_bits_size(), 1);
    let field_sizes: u64 = st
        .fields()
        .iter()
        .map(|f| registry.get(f.ty).size())
        .sum();
    assert!(ty.size() >= st.missing_bits_size() + field_sizes);
    assert_eq!(ty.alignment(), 8);

    for i in 0..st.len() {
        let field_layout = registry.get(st.field(i).ty).layout();
        assert_eq!(st.field_offset(i) % field_layout.alignment, 0);
        if i > 0 {
            let prev_end =
                st.field_offset(i - 1) + registry.get(st.field(i - 1).ty).size();
            assert!(st.field_offset(i) >= prev_end);
        }
    }

    let mut other = TypeRegistry::new();
    let again = other.parse(text).unwrap();
    assert_eq!(other.ty(again).layout(), ty.layout());
    let other_st = other.ty(again).as_struct().unwrap();
    for i in 0..st.len() {
        assert_eq!(other_st.field_offset(i), st.field_offset(i));
    }
}

#[test]
fn test_locus_lowers_to_contig_pos_struct() {
    let mut registry = TypeRegistry::new();
    for required in [false, true] {
        let locus = registry.locus_type("GRCh37", required);
        let ty = registry.ty(locus);
        assert!(!ty.is_fundamental());

        let fundamental = ty.fundamental();
        assert_eq!(fundamental.kind(), Kind::Struct);
        assert_eq!(fundamental.required(), required);
        assert_eq!(
            fundamental.to_string(),
            if required {
                "!Struct{contig: !String, pos: !Int32}"
            } else {
                "Struct{contig: !String, pos: !Int32}"
            }
        );
        assert_eq!(fundamental.layout(), Layout::new(8, 12));
        assert_eq!(ty.layout(), fundamental.layout());
    }
}

#[test]
fn test_compound_types_lower_to_representations() {
    let mut registry = TypeRegistry::new();

    let set = registry.parse("!Set[Int32]").unwrap();
    let array = registry.parse("!Array[Int32]").unwrap();
    assert_eq!(registry.ty(set).fundamental().id(), array);
    assert_eq!(registry.ty(set).element().unwrap().id(), registry.int32(false));

    let call = registry.call(false);
    assert_eq!(registry.ty(call).fundamental().id(), registry.int32(false));

    let variant = registry.parse("Variant(GRCh38)").unwrap();
    let expected = registry
        .parse(
            "Struct{contig: !String, pos: !Int32, ref: !String, \
             altAlleles: !Array[!Struct{ref: !String, alt: !String}]}",
        )
        .unwrap();
    assert_eq!(registry.ty(variant).fundamental().id(), expected);

    let representation = registry.ty(variant).representation().unwrap();
    assert_eq!(
        representation.to_string(),
        "Struct{contig: !String, pos: !Int32, ref: !String, altAlleles: !Array[!AltAllele]}"
    );
    assert!(!representation.is_fundamental());
}

#[test]
fn test_fundamental_closure() {
    let mut registry = TypeRegistry::new();
    registry
        .parse(
            "Struct{v: Variant(GRCh37), s: Set[Locus(GRCh37)], \
             g: Array[Struct{GT: Call, AD: Array[!Int32], alleles: Set[AltAllele]}]}",
        )
        .unwrap();

    for id in all_ids(&registry) {
        let ty = registry.ty(id);
        let fundamental = ty.fundamental();
        assert!(fundamental.is_fundamental(), "{ty:?}");
        assert!(!fundamental.kind().is_compound(), "{ty:?}");
        assert_eq!(fundamental.required(), ty.required(), "{ty:?}");
        assert_eq!(fundamental.layout(), ty.layout(), "{ty:?}");
        for f in fundamental.fields() {
            assert!(registry.ty(f.ty).is_fundamental());
        }
        if let Some(element) = fundamental.element() {
            assert!(element.is_fundamental());
        }
    }
}

#[test]
fn test_display_parses_back_to_the_same_type() {
    let mut registry = TypeRegistry::new();
    let texts = [
        "Boolean",
        "!Int64",
        "Array[!Float32]",
        "Set[String]",
        "Struct{}",
        "!Struct{a: Int32, b: Array[Float64]}",
        "Struct{locus: !Locus(GRCh37), alleles: Array[AltAllele], GT: Call}",
        "Variant(GRCh38)",
    ];
    for text in texts {
        let id = registry.parse(text).unwrap();
        let printed = registry.ty(id).to_string();
        assert_eq!(registry.parse(&printed).unwrap(), id, "{text} -> {printed}");
    }
    let id = registry.parse("Struct{a: Int32 b: Array[Float64]}").unwrap();
    assert_eq!(
        registry.ty(id).to_string(),
        "Struct{a: Int32, b: Array[Float64]}"
    );
}

#[test]
fn test_matrix_table_schema_row_impl() {
    let mut registry = TypeRegistry::new();
    let global = registry.parse("Empty").unwrap();
    let col_key = registry.parse("String").unwrap();
    let col = registry.parse("Struct{pop: String}").unwrap();
    let row_key = registry.parse("!Variant(GRCh37)").unwrap();
    let row = registry.parse("Struct{qual: Float64}").unwrap();
    let entry = registry.parse("Struct{GT: Call, DP: Int32}").unwrap();
    let schema = registry.matrix_table_schema(global, col_key, col, row_key, row, entry);

    assert_eq!(schema.kind(), Kind::MatrixTableSchema);
    let row_impl = registry.ty(schema.row_impl());
    assert!(!row_impl.required());
    assert_eq!(
        row_impl.to_string(),
        "Struct{pk: !Locus(GRCh37), v: !Variant(GRCh37), va: Struct{qual: Float64}, \
         gs: Array[Struct{GT: Call, DP: Int32}]}"
    );

    let fundamental = registry.ty(schema.row_impl_fundamental(&registry));
    assert!(fundamental.is_fundamental());
    assert_eq!(fundamental.field_type(0).unwrap().kind(), Kind::Struct);
    let gs = fundamental.field_type(3).unwrap();
    assert_eq!(gs.kind(), Kind::Array);
    assert_eq!(
        gs.element().unwrap().field_type(0).unwrap().id(),
        registry.int32(false)
    );

    let printed = schema.display(&registry).to_string();
    assert!(printed.contains("row_key: !Variant(GRCh37)"));
    assert!(printed.contains("entry: Struct{GT: Call, DP: Int32}"));
}

#[test]
fn test_non_variant_row_key_is_its_own_partition_key() {
    let mut registry = TypeRegistry::new();
    let key = registry.parse("!Locus(GRCh38)").unwrap();
    let empty = registry.empty_struct(false);
    let schema = registry.matrix_table_schema(empty, empty, empty, key, empty, empty);
    let row_impl = registry.ty(schema.row_impl());
    assert_eq!(row_impl.field_type(0).unwrap().id(), key);
    assert_eq!(row_impl.field_type(1).unwrap().id(), key);
}

#[test]
fn test_registry_is_shareable_across_threads() {
    let mut registry = TypeRegistry::new();
    let id = registry.parse("Array[Struct{a: Int32}]").unwrap();
    let registry = &registry;
    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(move || {
                assert_eq!(registry.ty(id).kind(), Kind::Array);
                assert_eq!(registry.ty(id).size(), 8);
            });
        }
    });
}
