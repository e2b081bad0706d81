//! Integration tests for the Generator API
//!
//! These tests drive the public API from a TOML hierarchy to XML.

use float_cmp::assert_approx_eq;

use latgen::{
    Generator, LatgenError, LatticeError,
    config::AppConfig,
    element::{ElementKind, HardwareSection},
    export::{Parameter, ParameterSource, ReadError},
    hierarchy::Device,
    identifier::Id,
};

const MEBT: &str = r#"
    id = "MEBT"
    length = 0.0

    [[sequence]]
    id = "MEBT_Mag"
    length = 6.0

    [[sequence.device]]
    id = "MEBT_Mag:QH01"
    kind = "QH"
    position = 1.0
    length = 0.5
    design = { field = 12.0 }

    [[sequence.device]]
    id = "MEBT_Mag:DCH01"
    kind = "DCH"
    position = 1.1
    length = 0.1

    [[sequence.device]]
    id = "MEBT_Mag:QV02"
    kind = "QV"
    position = 4.0
    length = 0.5
    effective_length = 0.4

    [[sequence]]
    id = "MEBT_RF"
    position = 6.0
    length = 4.0

    [[sequence.device]]
    id = "MEBT_RF:RG01"
    kind = "RG"
    position = 2.0
    length = 0.2
    design = { frequency = 402.5, phase = -90.0, energy_gain = 0.1 }

    [[sequence.device]]
    id = "MEBT_RF:BPM01"
    kind = "BPM"
    position = 3.5
"#;

#[test]
fn test_generator_api_exists() {
    let _generator = Generator::default();
}

#[test]
fn test_load_and_build() {
    let generator = Generator::default();
    let hierarchy = generator.load(MEBT).expect("Failed to load hierarchy");
    let generated = generator.build(&hierarchy).expect("Failed to build lattice");
    let lattice = generated.lattice();

    assert_eq!(lattice.name(), "MEBT");
    assert_approx_eq!(f64, lattice.length(), 10.0);
    assert!(lattice.check_consistency().is_ok());
    assert!(generated.diagnostics().is_empty());
}

#[test]
fn test_association_covers_every_device() {
    let generator = Generator::default();
    let hierarchy = generator.load(MEBT).expect("Failed to load hierarchy");
    let generated = generator.build(&hierarchy).expect("Failed to build lattice");
    let lattice = generated.lattice();

    for (device, position) in hierarchy.placed_devices() {
        let element = lattice
            .element_for(device.id())
            .unwrap_or_else(|| panic!("{} has no element", device.id()));
        assert_approx_eq!(f64, element.position(), position, epsilon = 1.0e-9);
    }
    assert_eq!(lattice.association().len(), 5);
}

#[test]
fn test_steerer_splits_quadrupole_half() {
    let generator = Generator::default();
    let hierarchy = generator.load(MEBT).expect("Failed to load hierarchy");
    let generated = generator.build(&hierarchy).expect("Failed to build lattice");
    let lattice = generated.lattice();

    let sections: Vec<_> = lattice
        .iter()
        .filter(|element| element.name() == "MEBT_Mag:QH01")
        .map(|element| element.section())
        .collect();

    assert_eq!(
        sections,
        vec![
            HardwareSection::Upstream,
            HardwareSection::Internal,
            HardwareSection::Downstream,
        ]
    );

    let steerer = lattice
        .element_for(Id::new("MEBT_Mag:DCH01"))
        .expect("steerer placed");
    assert_eq!(steerer.kind(), ElementKind::HSteerer);
}

#[test]
fn test_render_xml() {
    let generator = Generator::default();
    let hierarchy = generator.load(MEBT).expect("Failed to load hierarchy");
    let generated = generator.build(&hierarchy).expect("Failed to build lattice");

    let xml = generator
        .render_xml(generated.lattice(), &hierarchy)
        .expect("Failed to render XML");

    assert!(xml.contains("<Lattice"), "Output should contain Lattice tag");
    assert!(xml.contains("</Lattice>"), "Output should be complete XML");
    assert!(xml.contains(r#"id="MEBT_RF:RG01""#));
    assert!(xml.contains(r#"name="Frequency" type="double" value="402500000""#));
    assert!(!xml.contains(r#"id="MARKER""#));
}

#[test]
fn test_invalid_hierarchy_returns_input_error() {
    let generator = Generator::default();
    let result = generator.load("id = 3\nlength = \"long\"");

    assert!(matches!(result, Err(LatgenError::Input(_))));
}

#[test]
fn test_overlap_returns_lattice_error() {
    let source = r#"
        id = "BAD"

        [[device]]
        id = "Q1"
        kind = "QH"
        position = 1.0
        length = 2.0

        [[device]]
        id = "Q2"
        kind = "QH"
        position = 1.5
        length = 2.0
    "#;

    let generator = Generator::default();
    let hierarchy = generator.load(source).expect("Failed to load hierarchy");
    let result = generator.build(&hierarchy);

    assert!(matches!(
        result,
        Err(LatgenError::Lattice(LatticeError::GeometryInconsistency { .. }))
    ));
}

#[test]
fn test_generator_reusability() {
    let generator = Generator::new(AppConfig::default());
    let hierarchy = generator.load(MEBT).expect("Failed to load hierarchy");

    let first = generator.build(&hierarchy).expect("Failed to build lattice");
    let second = generator.build(&hierarchy).expect("Failed to build lattice");

    assert_eq!(first.lattice().elements(), second.lattice().elements());
}

/// Reports every field as 1.0 and refuses everything else.
struct FieldsOnly;

impl ParameterSource for FieldsOnly {
    fn read(&self, device: &Device, parameter: Parameter) -> Result<f64, ReadError> {
        match parameter {
            Parameter::Field => Ok(1.0),
            _ => Err(ReadError {
                device: device.id().to_string(),
                parameter,
                reason: "not connected".to_string(),
            }),
        }
    }
}

#[test]
fn test_render_xml_with_live_source() {
    let generator = Generator::default();
    let hierarchy = generator.load(MEBT).expect("Failed to load hierarchy");
    let generated = generator.build(&hierarchy).expect("Failed to build lattice");

    let xml = generator
        .render_xml_with(generated.lattice(), &hierarchy, &FieldsOnly)
        .expect("Failed to render XML");

    assert!(xml.contains(r#"name="MagField" type="double" value="1""#));
    assert!(!xml.contains(r#"name="MagField" type="double" value="12""#));
    // RF reads fail and fall back to the design values.
    assert!(xml.contains(r#"name="Frequency" type="double" value="402500000""#));
}
