use anyhow::Result;
use passage_analyzer::{logger, App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env()?;

    // 初始化日志
    logger::init(config.verbose_logging);

    // 初始化并运行应用
    let summary = App::initialize(config).run().await?;

    println!(
        "Analysis complete! Reports saved to: {}",
        summary.report.dir.display()
    );
    println!(
        "Total execution time: {:.2} seconds",
        summary.elapsed.as_secs_f64()
    );

    Ok(())
}
