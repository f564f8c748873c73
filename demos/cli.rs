use anyhow::Result;
use syno_api::client::SynoClientBuilder;
use syno_api::download_station::AdditionalField;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let client = SynoClientBuilder::from_env()?.build()?;

    client.login().await?;

    let station = client.download_station();
    let info = station.info().await?;
    println!("Download Station {}", info.version_string());

    let tasks = station
        .task_list(0, -1, &[AdditionalField::Detail, AdditionalField::Transfer])
        .await?;
    println!("{} tasks", tasks.len());
    for task in &tasks {
        println!(
            "task: {}, title: {}, status: {:?}, size: {}, progress: {}% {} {}",
            task.id(),
            task.title(),
            task.status(),
            task.calculate_size(),
            task.calculate_progress(),
            task.calculate_speed(),
            task.calculate_time_left()
        );
    }

    Ok(())
}
