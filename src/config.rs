pub struct Config {
    pub dump_ast: bool,
    pub emit_js: bool,
    pub lower: bool,
}
