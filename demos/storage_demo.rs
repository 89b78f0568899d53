use chrono::NaiveDate;
use env_logger::Env;
use kennel::storage::dog_filter;
use kennel::storage::types::{NewDog, NewOwner, Page, Sex};
use kennel::{DatabaseStorage, Storage};
use log::{info, warn};
use std::env;
use std::fs;
use std::path::PathBuf;

#[tokio::main]
async fn main() {
    // Initialize logger (RUST_LOG can override; default to info)
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info")).try_init();

    // Choose an output directory for the demo database
    let out_dir: PathBuf = env::var("STORAGE_DEMO_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            env::current_dir()
                .expect("cwd")
                .join("target")
                .join("storage_demo")
        });
    fs::create_dir_all(&out_dir).expect("create output dir");
    let db_path = out_dir.join("storage_demo.sqlite3");
    let _ = fs::remove_file(&db_path);

    info!("Using DatabaseStorage at {}", db_path.display());
    let storage = DatabaseStorage::new_file(&db_path)
        .await
        .expect("create db (file)");

    let owner = storage
        .create_owner(&NewOwner {
            first_name: "Carmen".to_string(),
            last_name: "Vidal Soler".to_string(),
            city: "Valencia".to_string(),
            postal_code: "46001".to_string(),
            email: "carmen@example.com".to_string(),
            phone: "+34 611 222 333".to_string(),
        })
        .await
        .expect("create owner");
    info!("Saved owner {} ({})", owner.id, owner.email);

    for (name, sex, sterilized) in [("Kira", Sex::Female, true), ("Bruno", Sex::Male, false)] {
        let dog = storage
            .create_dog(&NewDog {
                name: name.to_string(),
                birth_date: NaiveDate::from_ymd_opt(2021, 3, 14).expect("valid date"),
                weight: 18.4,
                owner_id: owner.id,
                sex,
                sterilized,
            })
            .await
            .expect("create dog");
        info!("Saved dog {} ({})", dog.id, dog.name);
    }

    let in_valencia = storage
        .find_dogs(dog_filter::by_city("Valencia"))
        .await
        .expect("filter by city");
    info!("Dogs in Valencia: {}", in_valencia.len());

    match storage
        .create_dog(&NewDog {
            name: "Ghost".to_string(),
            birth_date: NaiveDate::from_ymd_opt(2022, 1, 1).expect("valid date"),
            weight: 4.0,
            owner_id: 9999,
            sex: Sex::Male,
            sterilized: false,
        })
        .await
    {
        Ok(_) => warn!("Dog with a missing owner was accepted"),
        Err(e) => info!("Dog with a missing owner rejected: {}", e),
    }

    storage.delete_owner(owner.id).await.expect("delete owner");
    let dogs = storage.list_dogs(Page::default()).await.expect("list dogs");
    for dog in &dogs {
        info!("Dog {} now has owner {:?}", dog.name, dog.owner_id);
    }
    println!("Demo complete. Database at: {}", db_path.display());
}
