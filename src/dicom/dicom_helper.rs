use dicom_object::InMemDicomObject;

/// Declares a struct of scalar DICOM attributes read by keyword.
///
/// Each entry is `field: Type = "(gggg,eeee)" "Keyword" required|optional`.
/// Optional attributes become `Option<Type>`; a missing required attribute
/// fails `from_dicom_object`.
#[macro_export]
macro_rules! dicom_attributes {
    ($name:ident { $($field:ident: $ty:ty = $tag:literal $keyword:literal $kind:ident),* $(,)? }) => {
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            $(
                pub $field: $crate::dicom_attributes!(@type $ty, $kind),
            )*
        }

        impl $name {
            pub fn from_dicom_object(obj: &::dicom_object::InMemDicomObject) -> ::anyhow::Result<Self> {
                Ok($name {
                    $(
                        $field: $crate::dicom_attributes!(@read obj, $ty, $keyword, $kind),
                    )*
                })
            }

            // One "tag keyword: value" line per attribute
            pub fn format_tags(&self) -> String {
                let mut result = String::new();
                $(
                    $crate::dicom_attributes!(@line self, result, $field, $tag, $keyword, $kind);
                )*
                result
            }
        }
    };

    (@type $ty:ty, required) => { $ty };
    (@type $ty:ty, optional) => { Option<$ty> };

    (@read $obj:ident, $ty:ty, $keyword:literal, required) => {
        $crate::dicom::get_value::<$ty>($obj, $keyword)
            .ok_or_else(|| ::anyhow::anyhow!("Missing {}", $keyword))?
    };
    (@read $obj:ident, $ty:ty, $keyword:literal, optional) => {
        $crate::dicom::get_value::<$ty>($obj, $keyword)
    };

    (@line $self:ident, $result:ident, $field:ident, $tag:literal, $keyword:literal, required) => {
        $result.push_str(&format!("{} {}: {:?}\n", $tag, $keyword, &$self.$field));
    };
    (@line $self:ident, $result:ident, $field:ident, $tag:literal, $keyword:literal, optional) => {
        match &$self.$field {
            Some(val) => $result.push_str(&format!("{} {}: Some({:?})\n", $tag, $keyword, val)),
            None => $result.push_str(&format!("{} {}: None (Optional)\n", $tag, $keyword)),
        }
    };
}

/// Reads an attribute by keyword and parses it as `T`; `None` when the
/// attribute is absent or does not parse.
pub fn get_value<T>(obj: &InMemDicomObject, tag: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    obj.element_by_name(tag)
        .ok()
        .and_then(|e| e.value().to_str().ok())
        .and_then(|v| v.trim().parse::<T>().ok())
}
