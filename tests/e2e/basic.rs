use super::*;

#[test]
fn copies_tree() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("src/a.txt", "hello")?;
    space.write("src/sub/b.txt", "world")?;

    let out = space.run_expect(&mut lazyb_command(vec![]))?;
    assert_output_contains(&out, "rebuilt 2 files, deleted 0");
    assert_eq!(space.read("out/a.txt")?, b"hello");
    assert_eq!(space.read("out/sub/b.txt")?, b"world");
    Ok(())
}

#[test]
fn banner() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("site/banner.txt", "COPYRIGHT\n")?;
    space.write("site/a.txt", "x")?;

    space.run_expect(&mut lazyb_command(vec![
        "site", "-o", "public", "-b", "banner.txt",
    ]))?;
    assert_eq!(space.read("public/a.txt")?, b"/* COPYRIGHT */\nx");
    assert!(!space.exists("public/banner.txt"));
    Ok(())
}

#[test]
fn chdir() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("proj/src/a.txt", "a")?;

    space.run_expect(&mut lazyb_command(vec!["-C", "proj"]))?;
    assert_eq!(space.read("proj/out/a.txt")?, b"a");
    Ok(())
}

#[test]
fn missing_source() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    let out = space.run(&mut lazyb_command(vec!["nope"]))?;
    assert!(!out.status.success());
    assert_output_contains(&out, "lazyb: error: scan nope");
    Ok(())
}

#[test]
fn rooted_banner() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("src/a.txt", "a")?;
    let out = space.run(&mut lazyb_command(vec!["-b", "/etc/motd"]))?;
    assert!(!out.status.success());
    assert_output_contains(&out, "must be relative to the source");
    Ok(())
}

#[test]
fn trace() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("src/a.txt", "a")?;
    space.run_expect(&mut lazyb_command(vec!["-d", "trace"]))?;
    let trace = String::from_utf8(space.read("trace.json")?)?;
    assert!(trace.contains("\"name\": \"transform\""));
    assert!(trace.contains("\"name\": \"scan\""));
    Ok(())
}

#[test]
fn unknown_debug_tool() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    let out = space.run(&mut lazyb_command(vec!["-d", "bogus"]))?;
    assert!(!out.status.success());
    assert_output_contains(&out, "unknown -d \"bogus\"");
    Ok(())
}
