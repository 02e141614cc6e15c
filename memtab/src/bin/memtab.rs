use {
    anyhow::Context,
    log::info,
    memtab::{ObjectTable, config::TableConfig},
    std::{env::args_os, fs::File, io::BufReader},
};

fn main() -> anyhow::Result<()>
{
    pretty_env_logger::init();

    let config = match args_os().nth(1) {
        Some(path) => {
            let file = File::open(&path)
                .with_context(|| format!("Open {}", path.to_string_lossy()))?;
            TableConfig::from_json(BufReader::new(file))?
        },
        None => TableConfig::default(),
    };
    info!("Using {config:?}");

    let mut pool = config.build_pool()?;
    let mut table = ObjectTable::new(&mut pool, config.capacity)?;

    let id = table.acquire(1200)?;
    table.write(&id, b"hello world")?;

    let mut buf = [0; 80];
    let len = table.read(&id, &mut buf)?;
    println!("{}: {:?}", id, String::from_utf8_lossy(&buf[.. len]));

    for handle in table.iter() {
        println!(
            "#{} capacity={} used={} blocks={} locked={}",
            handle.id(),
            handle.capacity_bytes(),
            handle.used_bytes(),
            handle.blocks(),
            handle.is_locked(),
        );
    }

    table.release(id)?;
    drop(table);
    println!("{} of {} blocks free", pool.free_blocks(), pool.total_blocks());

    Ok(())
}
