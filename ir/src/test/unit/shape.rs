use strata_dtype::ElementType;

use crate::layout::Layout;
use crate::shape::Shape;

#[test]
fn test_array_accessors() {
    let shape = Shape::array(ElementType::BF16, [4, 8]);
    assert_eq!(shape.rank(), Some(2));
    assert_eq!(shape.dims(), Some(&[4i64, 8][..]));
    assert_eq!(shape.element_type(), Some(ElementType::BF16));
    assert_eq!(shape.element_count(), Some(32));
    assert!(!shape.is_tuple());
}

#[test]
fn test_scalar_has_rank_zero() {
    let shape = Shape::scalar(ElementType::S64);
    assert_eq!(shape.rank(), Some(0));
    assert_eq!(shape.element_count(), Some(1));
    assert_eq!(shape.to_string(), "s64[]");
}

#[test]
fn test_display_with_layout() {
    let shape = Shape::array_with_layout(ElementType::F32, [2, 3], Layout::default_for_rank(2));
    assert_eq!(shape.to_string(), "f32[2,3]{1,0}");
}

#[test]
fn test_tuple_display_and_accessors() {
    let shape = Shape::tuple([Shape::array(ElementType::F32, [2]), Shape::scalar(ElementType::Pred)]);
    assert!(shape.is_tuple());
    assert_eq!(shape.rank(), None);
    assert_eq!(shape.tuple_shapes().map(<[Shape]>::len), Some(2));
    assert_eq!(shape.to_string(), "(f32[2], pred[])");
}

#[test]
fn test_compatible_ignores_layout() {
    let plain = Shape::array(ElementType::F32, [2, 3]);
    let laid_out = Shape::array_with_layout(ElementType::F32, [2, 3], Layout::default_for_rank(2));
    assert!(plain.compatible_with(&laid_out));
    assert_ne!(plain, laid_out);
    assert_ne!(plain.hash_value(), laid_out.hash_value());
}

#[test]
fn test_incompatible_shapes() {
    let a = Shape::array(ElementType::F32, [2, 3]);
    assert!(!a.compatible_with(&Shape::array(ElementType::F32, [3, 2])));
    assert!(!a.compatible_with(&Shape::array(ElementType::F16, [2, 3])));
    assert!(!a.compatible_with(&Shape::tuple([a.clone()])));
}

#[test]
fn test_hash_distinguishes_element_type() {
    let a = Shape::array(ElementType::F32, [2]);
    let b = Shape::array(ElementType::S32, [2]);
    assert_ne!(a.hash_value(), b.hash_value());
}
