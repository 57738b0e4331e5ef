fn main() {
    if let Err(err) = asyncify_compiler::Builder::from_env().and_then(|builder| builder.build()) {
        panic!("asyncify generation failed: {err}");
    }
}
