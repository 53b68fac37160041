pub use pretty::{BoxAllocator, BoxDoc, DocAllocator, DocBuilder};

pub const NEST_UNIT: isize = 2;

pub fn render(doc: BoxDoc<'_>, width: usize) -> String {
    let mut writer = Vec::new();
    doc.render(width, &mut writer)
        .expect("writing into Vec is always ok");
    String::from_utf8(writer).expect("generated code must be correct utf8")
}
