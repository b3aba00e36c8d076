use burn::tensor::backend::Backend;
use burn_ndarray::NdArray;
use image::{Rgb, RgbImage};
use indexmap::IndexMap;

use burn_texture_cvae::{
    Cvae, GenerationError, TextureGenerator, TextureMetadata, TransitionConfig, apply_transitions,
};

type InferBackend = NdArray<f32>;

fn generator(classes: &[&str]) -> TextureGenerator<InferBackend> {
    let metadata = TextureMetadata::new(
        classes.iter().map(|name| name.to_string()).collect(),
        4,
        8,
    );
    let device = <InferBackend as Backend>::Device::default();
    let model = Cvae::<InferBackend>::new(&metadata.model_config(), &device);
    TextureGenerator::new(model, metadata, device).expect("generator")
}

fn solid(color: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(8, 8, Rgb(color))
}

#[test]
fn generates_each_class_in_order() {
    let generator = generator(&["dirt", "grass_top", "stone"]);
    let images = generator.generate_all().expect("generate all");

    let names: Vec<&str> = images.keys().map(String::as_str).collect();
    assert_eq!(names, ["dirt", "grass_top", "stone"]);
    assert!(images.values().all(|image| image.dimensions() == (8, 8)));
}

#[test]
fn unknown_names_are_typed_errors() {
    let generator = generator(&["dirt", "stone"]);

    assert!(matches!(
        generator.generate("lava"),
        Err(GenerationError::UnknownTexture(name)) if name == "lava"
    ));
    assert!(matches!(
        generator.mix("dirt", "lava", 0.5),
        Err(GenerationError::UnknownTexture(_))
    ));
    assert!(matches!(
        generator.generate_many(&["stone".to_string(), "sand".to_string()]),
        Err(GenerationError::UnknownTexture(name)) if name == "sand"
    ));
}

#[test]
fn mix_accepts_out_of_range_ratios() {
    let generator = generator(&["dirt", "stone"]);
    assert_eq!(
        generator.mix("dirt", "stone", 1.7).expect("mix").dimensions(),
        (8, 8)
    );
    assert_eq!(
        generator.mix("stone", "stone", -3.0).expect("mix").dimensions(),
        (8, 8)
    );
}

#[test]
fn mismatched_model_is_rejected() {
    let device = <InferBackend as Backend>::Device::default();
    let trained_for = TextureMetadata::new(vec!["a".into(), "b".into()], 4, 8);
    let model = Cvae::<InferBackend>::new(&trained_for.model_config(), &device);
    let served_as = TextureMetadata::new(vec!["a".into(), "b".into(), "c".into()], 4, 8);

    assert!(TextureGenerator::new(model, served_as, device).is_err());
}

#[test]
fn transitions_follow_generated_classes() {
    let mut images = IndexMap::new();
    images.insert("dirt".to_string(), solid([120, 80, 40]));
    images.insert("grass_top".to_string(), solid([40, 170, 50]));
    images.insert("stone".to_string(), solid([128, 128, 128]));

    let transitions = vec![
        TransitionConfig::new("grass_side", "grass_top", "dirt"),
        TransitionConfig::new("snow_transition_side", "snow_top", "dirt"),
        TransitionConfig::new("stone", "grass_top", "stone"),
    ];
    let written = apply_transitions(&mut images, &transitions).expect("transitions");

    assert_eq!(written, ["grass_side", "stone"]);
    let names: Vec<&str> = images.keys().map(String::as_str).collect();
    assert_eq!(names, ["dirt", "grass_top", "stone", "grass_side"]);
    assert_eq!(*images["grass_side"].get_pixel(0, 0), Rgb([40, 170, 50]));
    assert_eq!(*images["grass_side"].get_pixel(0, 7), Rgb([120, 80, 40]));
    assert_eq!(*images["stone"].get_pixel(0, 0), Rgb([40, 170, 50]));
}
