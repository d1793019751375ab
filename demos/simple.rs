use cal_bdd::bdd::Bdd;
use cal_bdd::types::Var;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Debug,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let bdd = Bdd::default();
    println!("bdd = {:?}", bdd);

    println!("zero = {}", bdd.zero());
    println!("one = {}", bdd.one());

    let x1 = bdd.new_var_last()?;
    println!("x1 = {}", x1);
    let x2 = bdd.new_var_last()?;
    println!("x2 = {}", x2);
    let x3 = bdd.new_var_last()?;
    println!("x3 = {}", x3);

    let cube = bdd.and_many(&[&x1, &x2, &x3])?;
    println!("cube = {} of size {}", cube, cube.size());
    let f = x1.ite(&x2, &x3)?;
    println!("f = ite(x1, x2, x3) = {} of size {}", f, f.size());
    let h = f.constrain(&x2)?;
    println!("f constrained by x2 = {}", h);

    let s = f.satisfy()?;
    println!("satisfy(f) = {}, support {:?}", s, s.support());
    println!("f has {} models over 3 variables", f.sat_count(3));

    let id = bdd.association_init_vars(&[Var::new(1)])?;
    bdd.association_set_current(id)?;
    println!("exists x1. f = {}", f.exists()?);
    bdd.association_quit(id)?;

    println!("stats = {:?}", bdd.stats());

    Ok(())
}
