//! Tests for ColorSpaceResolver - descriptor resolution, caching and cycles.

use pagepaint_core::PdfError;
use pagepaint_core::function::{BasicFunctionEvaluator, NoFunctionEvaluator};
use pagepaint_core::model::color::{
    ColorSpace, ColorSpaceFamily, ColorSpaceResolver, NativeColorSpace, ResolverOptions,
};
use pagepaint_core::model::objects::{MemoryObjectStore, PDFObject, PDFStream};
use std::collections::HashMap;
use std::sync::Arc;

fn resolver_with(store: MemoryObjectStore) -> ColorSpaceResolver {
    ColorSpaceResolver::new(Arc::new(store), Arc::new(BasicFunctionEvaluator::new()))
}

fn empty_resolver() -> ColorSpaceResolver {
    resolver_with(MemoryObjectStore::new())
}

// ============================================================================
// Name and array forms
// ============================================================================

#[test]
fn test_every_name_token_resolves_to_its_family() {
    let resolver = empty_resolver();
    let cases = [
        ("DeviceGray", ColorSpaceFamily::DeviceGray),
        ("DeviceRGB", ColorSpaceFamily::DeviceRGB),
        ("DeviceCMYK", ColorSpaceFamily::DeviceCMYK),
        ("G", ColorSpaceFamily::DeviceGray),
        ("RGB", ColorSpaceFamily::DeviceRGB),
        ("CMYK", ColorSpaceFamily::DeviceCMYK),
        ("Lab", ColorSpaceFamily::Lab),
        ("Pattern", ColorSpaceFamily::Pattern),
    ];
    for (token, family) in cases {
        let space = resolver.resolve(&PDFObject::name(token)).unwrap();
        assert_eq!(space.family(), family, "token {token}");
    }
}

#[test]
fn test_unknown_name_is_unsupported() {
    let resolver = empty_resolver();
    for token in ["DeviceRGBA", "Indexed", "Separation", "", "rgb"] {
        let err = resolver.resolve(&PDFObject::name(token)).unwrap_err();
        assert!(
            matches!(err, PdfError::UnsupportedColorSpace(_)),
            "{token}: {err:?}"
        );
    }
    let err = resolver.resolve(&PDFObject::Int(3)).unwrap_err();
    assert!(matches!(err, PdfError::UnsupportedColorSpace(_)));
}

#[test]
fn test_device_rgb_array_aliases_singleton() {
    let resolver = empty_resolver();
    let space = resolver
        .resolve(&PDFObject::Array(vec![
            PDFObject::name("DeviceRGB"),
            PDFObject::Int(42),
        ]))
        .unwrap();
    assert!(Arc::ptr_eq(&space, &ColorSpace::device_rgb()));
}

#[test]
fn test_unknown_array_tag_is_unsupported() {
    let resolver = empty_resolver();
    let err = resolver
        .resolve(&PDFObject::Array(vec![PDFObject::name("Shading")]))
        .unwrap_err();
    assert!(matches!(err, PdfError::UnsupportedColorSpace(_)));
}

#[test]
fn test_calgray_reads_dictionary() {
    let resolver = empty_resolver();
    let mut dict = HashMap::new();
    dict.insert("WhitePoint".to_string(), PDFObject::reals(&[0.9505, 1.0, 1.089]));
    dict.insert("Gamma".to_string(), PDFObject::Real(2.2));
    let space = resolver
        .resolve(&PDFObject::Array(vec![
            PDFObject::name("CalGray"),
            PDFObject::Dict(dict),
        ]))
        .unwrap();
    match space.as_ref() {
        ColorSpace::CalGray(cal) => assert_eq!(cal.gamma, 2.2),
        other => panic!("expected CalGray, got {other:?}"),
    }
}

// ============================================================================
// Indexed
// ============================================================================

fn indexed_rgb() -> PDFObject {
    PDFObject::Array(vec![
        PDFObject::name("Indexed"),
        PDFObject::name("DeviceRGB"),
        PDFObject::Int(1),
        PDFObject::String(vec![0xFF, 0x00, 0x00, 0x00, 0xFF, 0x00]),
    ])
}

#[test]
fn test_indexed_rows_are_exact() {
    let space = empty_resolver().resolve(&indexed_rgb()).unwrap();
    assert_eq!(space.n_components(), 1);
    assert_eq!(space.to_rgb(&[0.0]).unwrap().unwrap().as_slice(), &[1.0, 0.0, 0.0]);
    assert_eq!(space.to_rgb(&[1.0]).unwrap().unwrap().as_slice(), &[0.0, 1.0, 0.0]);
}

#[test]
fn test_indexed_out_of_range_clamps_to_last_row() {
    let space = empty_resolver().resolve(&indexed_rgb()).unwrap();
    assert_eq!(space.to_rgb(&[2.0]).unwrap().unwrap().as_slice(), &[0.0, 1.0, 0.0]);
    assert_eq!(space.to_rgb(&[-4.0]).unwrap().unwrap().as_slice(), &[1.0, 0.0, 0.0]);
}

#[test]
fn test_indexed_lookup_from_stream() {
    let mut store = MemoryObjectStore::new();
    let table = store.insert(
        7,
        PDFObject::Stream(Box::new(PDFStream::new(HashMap::new(), vec![0u8, 128, 255]))),
    );
    let resolver = resolver_with(store);
    let space = resolver
        .resolve(&PDFObject::Array(vec![
            PDFObject::name("I"),
            PDFObject::name("G"),
            PDFObject::Int(2),
            PDFObject::Ref(table),
        ]))
        .unwrap();
    let gray = space.to_rgb(&[2.0]).unwrap().unwrap();
    assert_eq!(gray.as_slice(), &[1.0, 1.0, 1.0]);
}

// ============================================================================
// ICCBased
// ============================================================================

#[test]
fn test_icc_based_uses_alternate_without_n() {
    let mut attrs = HashMap::new();
    attrs.insert("Alternate".to_string(), PDFObject::name("DeviceCMYK"));
    let stream = PDFStream::new(attrs, Vec::new());
    let space = empty_resolver()
        .resolve(&PDFObject::Array(vec![
            PDFObject::name("ICCBased"),
            PDFObject::Stream(Box::new(stream)),
        ]))
        .unwrap();
    assert_eq!(space.family(), ColorSpaceFamily::ICCBased);
    assert_eq!(space.n_components(), 4);
    assert_eq!(space.initial_color().as_slice(), &[0.0, 0.0, 0.0, 0.0]);
}

#[test]
fn test_icc_based_two_components_need_an_alternate() {
    let mut attrs = HashMap::new();
    attrs.insert("N".to_string(), PDFObject::Int(2));
    let err = empty_resolver()
        .resolve(&PDFObject::Array(vec![
            PDFObject::name("ICCBased"),
            PDFObject::Stream(Box::new(PDFStream::new(attrs.clone(), Vec::new()))),
        ]))
        .unwrap_err();
    assert!(matches!(err, PdfError::UnsupportedColorSpace(_)));

    // a three-component alternate does not fit either
    attrs.insert("Alternate".to_string(), PDFObject::name("DeviceRGB"));
    let err = empty_resolver()
        .resolve(&PDFObject::Array(vec![
            PDFObject::name("ICCBased"),
            PDFObject::Stream(Box::new(PDFStream::new(attrs.clone(), Vec::new()))),
        ]))
        .unwrap_err();
    assert!(matches!(err, PdfError::UnsupportedColorSpace(_)));

    attrs.insert(
        "Alternate".to_string(),
        PDFObject::Array(vec![
            PDFObject::name("DeviceN"),
            PDFObject::Array(vec![PDFObject::name("A"), PDFObject::name("B")]),
            PDFObject::name("DeviceCMYK"),
            PDFObject::Int(0),
        ]),
    );
    let space = empty_resolver()
        .resolve(&PDFObject::Array(vec![
            PDFObject::name("ICCBased"),
            PDFObject::Stream(Box::new(PDFStream::new(attrs, Vec::new()))),
        ]))
        .unwrap();
    assert_eq!(space.family(), ColorSpaceFamily::ICCBased);
    assert_eq!(space.n_components(), 2);
    assert_eq!(space.initial_color().as_slice(), &[0.0, 0.0]);
    let ColorSpace::ICCBased(icc) = space.as_ref() else {
        panic!("expected ICCBased, got {space:?}");
    };
    assert_eq!(icc.fallback().family(), ColorSpaceFamily::DeviceN);
}

#[test]
fn test_reversed_lab_range_is_unsupported() {
    let mut dict = HashMap::new();
    dict.insert("WhitePoint".to_string(), PDFObject::reals(&[0.9505, 1.0, 1.089]));
    dict.insert("Range".to_string(), PDFObject::reals(&[100.0, -100.0, -100.0, 100.0]));
    let err = empty_resolver()
        .resolve(&PDFObject::Array(vec![PDFObject::name("Lab"), PDFObject::Dict(dict)]))
        .unwrap_err();
    assert!(matches!(err, PdfError::UnsupportedColorSpace(_)));
}

#[test]
fn test_native_spaces() {
    let resolver = empty_resolver();
    let srgb = resolver.resolve_native(&NativeColorSpace::Srgb).unwrap();
    assert!(Arc::ptr_eq(&srgb, &ColorSpace::device_rgb()));

    let icc = resolver
        .resolve_native(&NativeColorSpace::IccProfile {
            profile: bytes::Bytes::from_static(b"profile"),
            ranges: vec![(0.0, 1.0); 3],
        })
        .unwrap();
    assert_eq!(icc.family(), ColorSpaceFamily::ICCBased);
    assert_eq!(icc.n_components(), 3);

    let err = resolver
        .resolve_native(&NativeColorSpace::Other("DisplayP3".into()))
        .unwrap_err();
    assert!(matches!(err, PdfError::UnsupportedColorSpace(_)));
}

// ============================================================================
// References, cycles, caching
// ============================================================================

#[test]
fn test_self_referencing_indexed_is_rejected() {
    let mut store = MemoryObjectStore::new();
    let objref = pagepaint_core::model::PDFObjRef::new(1, 0);
    store.insert(
        1,
        PDFObject::Array(vec![
            PDFObject::name("Indexed"),
            PDFObject::Ref(objref),
            PDFObject::Int(0),
            PDFObject::String(vec![0]),
        ]),
    );
    let err = resolver_with(store).resolve(&PDFObject::Ref(objref)).unwrap_err();
    assert!(matches!(err, PdfError::UnsupportedColorSpace(_)));
}

#[test]
fn test_excessive_nesting_is_rejected() {
    let mut descriptor = PDFObject::name("DeviceRGB");
    for _ in 0..40 {
        descriptor = PDFObject::Array(vec![PDFObject::name("Pattern"), descriptor]);
    }
    let err = empty_resolver().resolve(&descriptor).unwrap_err();
    assert!(matches!(err, PdfError::UnsupportedColorSpace(_)));
}

#[test]
fn test_resolution_is_idempotent() {
    let mut store = MemoryObjectStore::new();
    let objref = store.insert(3, indexed_rgb());
    let resolver = resolver_with(store);
    let a = resolver.resolve(&PDFObject::Ref(objref)).unwrap();
    let b = resolver.resolve(&PDFObject::Ref(objref)).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(resolver.cached_len(), 1);

    let direct_a = resolver.resolve(&indexed_rgb()).unwrap();
    let direct_b = resolver.resolve(&indexed_rgb()).unwrap();
    for index in [0.0, 1.0, 2.0] {
        assert_eq!(direct_a.to_rgb(&[index]).unwrap(), direct_b.to_rgb(&[index]).unwrap());
        assert_eq!(direct_a.to_rgb(&[index]).unwrap(), a.to_rgb(&[index]).unwrap());
    }
}

#[test]
fn test_caching_disabled_still_equivalent() {
    let mut store = MemoryObjectStore::new();
    let objref = store.insert(3, indexed_rgb());
    let resolver = ColorSpaceResolver::with_options(
        Arc::new(store),
        Arc::new(NoFunctionEvaluator),
        ResolverOptions {
            caching: false,
            ..ResolverOptions::default()
        },
    );
    let a = resolver.resolve(&PDFObject::Ref(objref)).unwrap();
    let b = resolver.resolve(&PDFObject::Ref(objref)).unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(resolver.cached_len(), 0);
    assert_eq!(a.to_xyz(&[1.0]).unwrap(), b.to_xyz(&[1.0]).unwrap());
}

#[test]
fn test_missing_reference_propagates() {
    let err = empty_resolver()
        .resolve(&PDFObject::Ref(pagepaint_core::model::PDFObjRef::new(99, 0)))
        .unwrap_err();
    assert_eq!(err, PdfError::ObjectNotFound(99, 0));
}

#[test]
fn test_resource_lookup_falls_back_to_name() {
    let resolver = empty_resolver();
    let mut spaces = HashMap::new();
    spaces.insert("CS0".to_string(), indexed_rgb());
    let mut resources = HashMap::new();
    resources.insert("ColorSpace".to_string(), PDFObject::Dict(spaces));

    let cs0 = resolver.resolve_resource("CS0", &resources).unwrap();
    assert_eq!(cs0.family(), ColorSpaceFamily::Indexed);
    let rgb = resolver.resolve_resource("DeviceRGB", &resources).unwrap();
    assert_eq!(rgb.family(), ColorSpaceFamily::DeviceRGB);
}
