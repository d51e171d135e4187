use super::*;

pub trait HasElementType {
    const ELEMENT_TYPE: ElementType;
}

macro_rules! impl_element_type_ext {
    ($($ty:ty => $element_type:expr),* $(,)?) => {
        $(impl HasElementType for $ty { const ELEMENT_TYPE: ElementType = $element_type; })*
    };
}

impl_element_type_ext! {
    bool => ElementType::Pred,
    i8 => ElementType::S8, i16 => ElementType::S16, i32 => ElementType::S32, i64 => ElementType::S64,
    u8 => ElementType::U8, u16 => ElementType::U16, u32 => ElementType::U32, u64 => ElementType::U64,
    f32 => ElementType::F32, f64 => ElementType::F64,
}
