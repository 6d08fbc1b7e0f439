mod ingestion_once;
mod strategy_loop;
mod support;
