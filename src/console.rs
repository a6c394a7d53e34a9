use crate::batch_job::BatchJob;
use crate::item::Item;
use crate::task::Task;

/// Plain-text table of found items, numbered from 1
pub fn found_items_table(items: &[Item], show_urls: bool) -> String {
    let mut ret = format!("{} matching items found:\n", items.len());
    for (num, item) in items.iter().enumerate() {
        let label = item.label.as_deref().unwrap_or("");
        ret += &format!("{:>4}  {:<12} {label}", num + 1, item.id);
        if show_urls {
            ret += &format!("  {}", item.url());
        }
        ret += "\n";
    }
    ret
}

pub fn job_statistics(jobs: &[BatchJob]) -> String {
    let items: usize = jobs.iter().map(|job| job.number_of_items()).sum();
    format!("The jobs list now contain a total of {} jobs with a total of {items} items", jobs.len())
}

pub fn running_jobs(jobs: &[BatchJob]) -> String {
    let items: usize = jobs.iter().map(|job| job.number_of_items()).sum();
    format!("Running {} job(s) with a total of {items} items non-interactively now. You can take a coffee break and lean back :)", jobs.len())
}

pub fn best_practice(task: &Task) -> String {
    format!(
        "Best practice for '{}': only add main subjects that are specific. \
         Check that the found {} are really about the subject before adding them to the job queue.",
        task.label,
        task.target_description()
    )
}

pub const fn keep_an_eye_on_wdqs_lag() -> &'static str {
    "Please keep an eye on the WDQS lag while the jobs run, see https://grafana.wikimedia.org/d/000000489/wikidata-query-service"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch_job::tests::job;
    use crate::task::TaskId;

    #[test]
    fn test_found_items_table() {
        let items = vec![
            Item::new("Q1", Some("first article".into()), TaskId::Thesis),
            Item::new("Q22", None, TaskId::Thesis),
        ];
        let table = found_items_table(&items, false);
        assert!(table.starts_with("2 matching items found:\n"));
        assert!(table.contains("   1  Q1           first article\n"));
        assert!(!table.contains("https://"));
        assert!(found_items_table(&items, true).contains("https://www.wikidata.org/wiki/Q22"));
    }

    #[test]
    fn test_job_statistics() {
        let jobs = vec![job("Q42", &["Q1", "Q2"]), job("Q5", &["Q3"])];
        assert_eq!(
            job_statistics(&jobs),
            "The jobs list now contain a total of 2 jobs with a total of 3 items"
        );
        assert!(running_jobs(&jobs).starts_with("Running 2 job(s) with a total of 3 items"));
    }
}
