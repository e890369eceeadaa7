use data_structure::define_index;

define_index!(pub TypeIdx);
define_index!(pub FuncIdx);
define_index!(pub LocalIdx);
