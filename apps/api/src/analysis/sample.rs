/// Built-in resume used when the caller asks for a sample analysis.
/// Lets the provider chain be exercised without uploading a document.
pub const SAMPLE_RESUME_TEXT: &str = r#"Alex Morgan
Backend Software Engineer

Contact
Email: alex.morgan@example.com
Phone: (555) 010-4477
GitHub: github.com/alexmorgan-dev

Professional Summary
Backend engineer with 7 years of experience designing and operating high-throughput services
for logistics and payments platforms. Comfortable owning systems end to end, from schema design
and API contracts to on-call and capacity planning.

Skills
- Rust, Go, Python
- PostgreSQL, Redis, Kafka
- Docker, Kubernetes, Terraform
- gRPC, REST API design
- Observability: Prometheus, OpenTelemetry
- CI/CD with GitHub Actions

Experience

Senior Backend Engineer
FreightLine Systems | April 2021 - Present
- Rebuilt the shipment tracking ingestion pipeline in Rust, cutting p99 latency from 900 ms to 120 ms
- Designed a partitioned PostgreSQL schema holding 2.4 billion tracking events with sub-second queries
- Led migration of 14 services to Kubernetes, reducing infrastructure spend by 28%
- Introduced structured logging and tracing, shortening mean time to resolution by 35%
- Mentored 4 engineers through design reviews and pairing

Backend Engineer
PayBridge Inc. | June 2018 - March 2021
- Built an idempotent payment webhook service handling 3 million events per day
- Implemented a reconciliation job in Go that recovered $1.2M in unmatched settlements per year
- Added contract tests to 30+ internal APIs, reducing production regressions by 40%

Junior Developer
Brightleaf Digital | July 2016 - May 2018
- Maintained Django applications for retail clients
- Automated nightly data exports, saving the operations team 10 hours per week

Education
B.Sc. Computer Science
State University of Technology | 2012 - 2016

Certifications
- Certified Kubernetes Application Developer (2022)
- AWS Certified Developer - Associate (2020)
"#;
