use anyhow::{bail, Error};
use carpool::{
    endpoints, ApiClient, ApiError, Capability, Config, Decision, FileStore,
    Guard, Id, Navigator, NewRide, Registration, RideSearch, Route,
    SessionContext,
};
use std::{path::PathBuf, sync::Arc, time::Duration};
use structopt::StructOpt;
use url::Url;

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    let args = Args::from_args();

    log::debug!(
        "Using the API at {} with the session in {}",
        args.api,
        args.session.display()
    );

    let context = SessionContext::new(FileStore::new(&args.session));
    let config = Config::new(args.api).with_timeout(Duration::from_secs(30));
    let client = ApiClient::new(config, Arc::clone(&context))?;
    let mut navigator = Navigator::new(&context);

    // pick up where the last invocation left off
    context.initialize(&client).await;

    let outcome = Arc::clone(&context).scope(run(&client, args.command)).await;

    match outcome {
        Ok(()) => Ok(()),
        Err(e) => {
            if navigator.pending() == Some(Route::Login) {
                eprintln!("Your session has expired, please log in again.");
            }

            match e.downcast_ref::<ApiError>() {
                Some(api_error) => bail!("{}", api_error.user_message()),
                None => Err(e),
            }
        },
    }
}

async fn run(client: &ApiClient, command: Command) -> Result<(), Error> {
    let context = SessionContext::current();

    match command {
        Command::Login { email, password } => {
            let user = context.login(client, &email, &password).await?;
            println!("Hi, {}", user.first_name());
        },
        Command::Register {
            name,
            email,
            phone,
            password,
            driver,
        } => {
            let registration = Registration {
                name,
                email,
                phone,
                password,
                is_driver: driver,
            };
            let user = context.register(client, &registration).await?;
            println!("Welcome aboard, {}", user.first_name());
        },
        Command::Logout => {
            context.logout()?;
            println!("Logged out");
        },
        Command::Whoami => match context.user() {
            Some(user) => {
                println!("{} <{}>", user.name, user.email);
                let capabilities: Vec<_> =
                    user.capabilities().iter().collect();
                println!("Allowed to: {:?}", capabilities);
            },
            None => println!("Not logged in"),
        },
        Command::Search {
            from,
            to,
            date,
            min_seats,
        } => {
            let search = RideSearch {
                from_loc: from,
                to_loc: to,
                date,
                min_seats,
            };

            for ride in endpoints::search_rides(client, &search).await? {
                println!(
                    "{}  {} -> {}  {} {}  {}/{} seats  ₹{:.2}  ({})",
                    ride.id,
                    ride.start_location,
                    ride.end_location,
                    ride.date,
                    ride.time,
                    ride.seats_available,
                    ride.seats_total,
                    ride.price_per_seat,
                    ride.driver_name,
                );
            }
        },
        Command::Ride { ride } => {
            let ride = endpoints::get_ride(client, &ride).await?;
            println!("{:#?}", ride);
        },
        Command::Book { ride, seats } => {
            require(&context, Guard::Capability(Capability::BookRides))?;
            let booking = endpoints::book_ride(client, &ride, seats).await?;
            println!(
                "Booked {} seat(s), booking {}",
                booking.seats_booked, booking.id
            );
        },
        Command::Bookings => {
            require(&context, Guard::Capability(Capability::ViewBookings))?;

            for entry in endpoints::my_bookings(client).await? {
                println!(
                    "{}  {:?}  {} seat(s)  {} -> {} on {} at {}",
                    entry.booking.id,
                    entry.booking.status,
                    entry.booking.seats_booked,
                    entry.ride.start_location,
                    entry.ride.end_location,
                    entry.ride.date,
                    entry.ride.time,
                );
            }
        },
        Command::Cancel { booking } => {
            require(&context, Guard::Capability(Capability::ViewBookings))?;
            let message = endpoints::cancel_booking(client, &booking).await?;
            println!("{}", message);
        },
        Command::PostRide(ride) => {
            require(&context, Guard::Capability(Capability::PostRides))?;
            let ride = NewRide::from(ride);
            let ride = endpoints::create_ride(client, &ride).await?;
            println!("Posted ride {}", ride.id);
        },
        Command::MyRides => {
            require(&context, Guard::Capability(Capability::ViewOwnRides))?;

            for ride in endpoints::my_rides(client).await? {
                println!(
                    "{}  {} -> {}  {} {}  {:?}  {}/{} seats left",
                    ride.id,
                    ride.start_location,
                    ride.end_location,
                    ride.date,
                    ride.time,
                    ride.status,
                    ride.seats_available,
                    ride.seats_total,
                );
            }
        },
        Command::RideBookings { ride } => {
            require(
                &context,
                Guard::Capability(Capability::ViewRideBookings),
            )?;

            for booking in endpoints::ride_bookings(client, &ride).await? {
                println!(
                    "{}  {:?}  {} seat(s)  {} ({})",
                    booking.id,
                    booking.status,
                    booking.seats_booked,
                    booking.passenger_name,
                    booking.passenger_phone,
                );
            }
        },
        Command::Metrics => {
            require(&context, Guard::Capability(Capability::ViewMetrics))?;
            let metrics = endpoints::admin_metrics(client).await?;
            println!("{:#?}", metrics);
        },
    }

    Ok(())
}

fn require(context: &SessionContext, guard: Guard) -> Result<(), Error> {
    match guard.check(context) {
        Decision::Render => Ok(()),
        Decision::Redirect(Route::Login) => bail!("Please log in first"),
        Decision::Redirect(Route::Home) => {
            bail!("Your account isn't allowed to do that")
        },
        // initialization has finished before any command runs
        Decision::Placeholder => bail!("The session is still being checked"),
    }
}

#[derive(StructOpt)]
#[structopt(name = "carpool", about = "Find, offer, and book shared rides")]
struct Args {
    #[structopt(
        long = "api",
        env = "CARPOOL_API",
        default_value = "http://127.0.0.1:8000/api",
        help = "The carpool API's base URL"
    )]
    api: Url,
    #[structopt(
        long = "session",
        default_value = ".carpool-session.json",
        parse(from_os_str),
        help = "Where to keep the login session between runs"
    )]
    session: PathBuf,
    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt)]
enum Command {
    /// Log in with your email and password
    Login {
        #[structopt(short = "e", long = "email")]
        email: String,
        #[structopt(short = "p", long = "password")]
        password: String,
    },
    /// Create an account
    Register {
        #[structopt(long = "name")]
        name: String,
        #[structopt(short = "e", long = "email")]
        email: String,
        #[structopt(long = "phone")]
        phone: String,
        #[structopt(short = "p", long = "password")]
        password: String,
        #[structopt(long = "driver", help = "Register as a driver")]
        driver: bool,
    },
    Logout,
    /// Show who is logged in
    Whoami,
    /// Search for rides
    Search {
        #[structopt(long = "from")]
        from: Option<String>,
        #[structopt(long = "to")]
        to: Option<String>,
        #[structopt(long = "date", help = "YYYY-MM-DD")]
        date: Option<String>,
        #[structopt(long = "min-seats", default_value = "1")]
        min_seats: u32,
    },
    /// Show a single ride
    Ride { ride: Id },
    /// Book seats on a ride
    Book {
        ride: Id,
        #[structopt(long = "seats", default_value = "1")]
        seats: u32,
    },
    /// List your bookings
    Bookings,
    /// Cancel one of your bookings
    Cancel { booking: Id },
    /// Offer a ride (drivers only)
    PostRide(PostRide),
    /// List the rides you are driving
    MyRides,
    /// List the bookings on one of your rides
    RideBookings { ride: Id },
    /// Show platform statistics (administrators only)
    Metrics,
}

#[derive(StructOpt)]
struct PostRide {
    #[structopt(long = "from")]
    from: String,
    #[structopt(long = "to")]
    to: String,
    #[structopt(long = "date", help = "YYYY-MM-DD")]
    date: String,
    #[structopt(long = "time", help = "HH:MM")]
    time: String,
    #[structopt(long = "seats")]
    seats: u32,
    #[structopt(long = "price", help = "Price per seat")]
    price: f64,
    #[structopt(long = "distance", help = "Trip length in kilometres")]
    distance: f64,
    #[structopt(long = "vehicle")]
    vehicle: String,
    #[structopt(long = "notes")]
    notes: Option<String>,
}

impl From<PostRide> for NewRide {
    fn from(ride: PostRide) -> NewRide {
        NewRide {
            start_location: ride.from,
            end_location: ride.to,
            date: ride.date,
            time: ride.time,
            seats_total: ride.seats,
            price_per_seat: ride.price,
            distance_km: ride.distance,
            vehicle: ride.vehicle,
            notes: ride.notes,
        }
    }
}
