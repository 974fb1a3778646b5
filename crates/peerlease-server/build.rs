use vergen_gitcl::{BuildBuilder, CargoBuilder, Emitter, GitclBuilder, RustcBuilder};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let build = BuildBuilder::all_build()?;
    let cargo = CargoBuilder::all_cargo()?;
    let rustc = RustcBuilder::all_rustc()?;

    let mut emitter = Emitter::default();
    emitter
        .add_instructions(&build)?
        .add_instructions(&cargo)?
        .add_instructions(&rustc)?;

    // Source tarballs and container builds have no git checkout; `version.rs`
    // reports "unknown" for whatever is not emitted.
    if let Ok(git) = GitclBuilder::all_git() {
        emitter.add_instructions(&git)?;
    }

    emitter.emit()?;
    Ok(())
}
